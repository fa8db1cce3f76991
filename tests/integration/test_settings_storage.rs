//! Persisted upload settings backed by a throwaway SQLite file

use rust_lib_drive_picker::db::Database;
use rust_lib_drive_picker::settings::{
    default_upload_concurrency, get_transfer_throttle, get_upload_concurrency,
    set_transfer_throttle, set_upload_concurrency, TransferThrottle, MAX_UPLOAD_CONCURRENCY,
};
use tempfile::TempDir;

fn temp_database() -> (TempDir, Database) {
    let dir = tempfile::tempdir().expect("temp dir");
    let db = Database::at_path(dir.path().join("nested").join("picker.db"));
    db.init().expect("init database");
    (dir, db)
}

#[test]
fn test_upload_concurrency_defaults_and_persists() {
    let (_dir, db) = temp_database();
    assert_eq!(get_upload_concurrency(&db), Ok(default_upload_concurrency()));

    assert_eq!(set_upload_concurrency(&db, 4), Ok(4));
    assert_eq!(get_upload_concurrency(&db), Ok(4));

    let reopened = Database::at_path(db.path());
    assert_eq!(get_upload_concurrency(&reopened), Ok(4));
}

#[test]
fn test_upload_concurrency_rejects_out_of_range() {
    let (_dir, db) = temp_database();
    assert!(set_upload_concurrency(&db, 0).is_err());
    assert!(set_upload_concurrency(&db, MAX_UPLOAD_CONCURRENCY + 1).is_err());
    assert_eq!(get_upload_concurrency(&db), Ok(default_upload_concurrency()));
}

#[test]
fn test_stored_concurrency_is_clamped_on_read() {
    let (_dir, db) = temp_database();
    db.set_setting("upload_max_concurrency", "64").expect("raw write");
    assert_eq!(get_upload_concurrency(&db), Ok(MAX_UPLOAD_CONCURRENCY));

    db.set_setting("upload_max_concurrency", "lots").expect("raw write");
    assert!(get_upload_concurrency(&db).is_err());
}

#[test]
fn test_transfer_throttle_round_trip() {
    let (_dir, db) = temp_database();
    assert_eq!(get_transfer_throttle(&db), Ok(TransferThrottle::default()));

    let throttle = TransferThrottle {
        enabled: true,
        chunk_size: 1024,
        delay_millis: 10,
    };
    set_transfer_throttle(&db, throttle.clone()).expect("save throttle");
    assert_eq!(get_transfer_throttle(&db), Ok(throttle));

    let raw = db
        .get_setting("upload_throttle")
        .expect("read raw")
        .expect("stored");
    assert!(raw.contains("\"chunkSize\":1024"));
    assert!(raw.contains("\"delayMillis\":10"));
}

#[test]
fn test_transfer_throttle_validation_and_reset() {
    let (_dir, db) = temp_database();
    let zero = TransferThrottle {
        chunk_size: 0,
        ..TransferThrottle::default()
    };
    assert!(set_transfer_throttle(&db, zero).is_err());

    db.set_setting("upload_throttle", "{not json").expect("raw write");
    assert!(get_transfer_throttle(&db).is_err());

    db.delete_setting("upload_throttle").expect("delete");
    assert_eq!(get_transfer_throttle(&db), Ok(TransferThrottle::default()));
}
