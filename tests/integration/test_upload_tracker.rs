//! Aggregation and state machine of the upload tracker

use rust_lib_drive_picker::api::models::UploadStatus;
use rust_lib_drive_picker::upload_manager::UploadTracker;

#[test]
fn test_progress_boundary_completes_upload() {
    let mut tracker = UploadTracker::new();
    tracker.start_upload("id", "a.txt", None, 100);
    tracker.report_progress("id", 100);

    let upload = tracker.get("id").expect("upload");
    assert_eq!(upload.status, UploadStatus::Completed);
    assert!(upload.is_complete());
}

#[test]
fn test_average_ignores_completed_uploads() {
    let mut tracker = UploadTracker::new();
    tracker.start_upload("a", "a.bin", None, 100);
    tracker.start_upload("b", "b.bin", None, 100);
    tracker.report_progress("a", 50);
    tracker.report_progress("b", 100);

    assert_eq!(tracker.average_progress(), 0.5);
}

#[test]
fn test_clear_finished_twice_matches_once() {
    let mut tracker = UploadTracker::new();
    for id in ["a", "b", "c", "d"] {
        tracker.start_upload(id, id, None, 10);
    }
    tracker.report_progress("a", 10);
    tracker.report_error("b", "HTTP 500");
    tracker.cancel("c");

    tracker.clear_finished();
    let once = tracker.snapshot();
    tracker.clear_finished();
    assert_eq!(tracker.snapshot(), once);
    assert_eq!(once.uploads.len(), 1);
    assert_eq!(once.uploads[0].id, "d");
}

#[test]
fn test_two_concurrent_uploads_scenario() {
    let mut tracker = UploadTracker::new();
    tracker.start_upload("a", "a.bin", None, 1000);
    tracker.start_upload("b", "b.bin", None, 1000);
    tracker.report_progress("a", 500);
    tracker.report_progress("b", 1000);

    assert_eq!(tracker.active_count(), 1);
    assert_eq!(tracker.average_progress(), 0.5);
}

#[test]
fn test_paused_and_retrying_count_as_active() {
    let mut tracker = UploadTracker::new();
    tracker.enqueue("w", "w", None, 100);
    tracker.start_upload("p", "p", None, 100);
    tracker.report_progress("p", 20);
    tracker.pause("p");
    tracker.start_upload("r", "r", None, 100);
    tracker.report_progress("r", 40);
    tracker.mark_retrying("r");

    assert_eq!(tracker.active_count(), 3);
    assert!((tracker.average_progress() - 0.2).abs() < 1e-9);
}

#[test]
fn test_error_message_only_on_error() {
    let mut tracker = UploadTracker::new();
    tracker.start_upload("a", "a", None, 10);
    tracker.cancel("a");
    assert!(tracker.get("a").and_then(|u| u.error.clone()).is_none());

    tracker.start_upload("b", "b", None, 10);
    tracker.report_error("b", "quota exceeded");
    assert_eq!(
        tracker.get("b").and_then(|u| u.error.clone()).as_deref(),
        Some("quota exceeded")
    );
}

#[test]
fn test_unknown_ids_are_ignored() {
    let mut tracker = UploadTracker::new();
    assert!(tracker.report_progress("nope", 1).is_none());
    assert!(tracker.report_error("nope", "x").is_none());
    assert!(tracker.cancel("nope").is_none());
    assert!(tracker.remove("nope").is_none());
    assert!(tracker.is_empty());
}
