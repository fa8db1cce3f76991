//! Threaded uploads through the simulated transport

use crate::fixtures::{collect_statuses, wait_for_terminal, ACCOUNT, PROVIDER};
use rust_lib_drive_picker::accounts::{AccountDirectory, AccountProfile};
use rust_lib_drive_picker::api::models::{UploadProgress, UploadStatus};
use rust_lib_drive_picker::upload_manager::{
    FixedSizeChunker, ProgressObserver, SimulatedTransport, UploadManager,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

const TIMEOUT: Duration = Duration::from_secs(10);

fn slow_manager(transport: Arc<SimulatedTransport>, chunk: usize, delay_ms: u64) -> UploadManager {
    UploadManager::with_transport(transport).chunker(Arc::new(FixedSizeChunker::new(
        chunk,
        Duration::from_millis(delay_ms),
    )))
}

fn wait_until_idle(manager: &UploadManager) -> bool {
    let deadline = Instant::now() + TIMEOUT;
    while Instant::now() < deadline {
        if manager.active_count() == 0 {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}

#[test]
fn test_enqueue_runs_to_completion() {
    let transport = Arc::new(SimulatedTransport::new());
    let manager = slow_manager(transport.clone(), 4, 1);
    let rx = manager.subscribe_progress();

    let content: Vec<u8> = (0u8..16).collect();
    let id = manager
        .enqueue(Some("folder-1".to_string()), "notes.txt".to_string(), content.clone())
        .expect("enqueue");
    let statuses = collect_statuses(&rx, &id, TIMEOUT);

    assert_eq!(statuses.first(), Some(&UploadStatus::Waiting));
    assert_eq!(statuses.last(), Some(&UploadStatus::Completed));
    assert!(statuses.contains(&UploadStatus::Uploading));
    assert_eq!(transport.received("notes.txt"), Some(content));

    let upload = manager.get(&id).expect("tracked");
    assert_eq!(upload.uploaded, 16);
    assert_eq!(upload.parent_id.as_deref(), Some("folder-1"));
    assert_eq!(manager.active_count(), 0);
}

#[test]
fn test_duplicate_active_file_is_rejected() {
    let manager = slow_manager(Arc::new(SimulatedTransport::new()), 1, 20);
    manager
        .enqueue(None, "a.bin".to_string(), vec![0; 100])
        .expect("first");
    assert!(manager.enqueue(None, "a.bin".to_string(), vec![0; 100]).is_err());
    assert!(manager
        .enqueue(Some("other".to_string()), "a.bin".to_string(), vec![0; 1])
        .is_ok());
    assert!(manager.enqueue(None, "  ".to_string(), vec![0; 1]).is_err());
}

#[test]
fn test_cancel_mid_transfer() {
    let transport = Arc::new(SimulatedTransport::new());
    let manager = slow_manager(transport.clone(), 1, 20);
    let rx = manager.subscribe_progress();
    let id = manager
        .enqueue(None, "big.bin".to_string(), vec![1; 200])
        .expect("enqueue");

    let deadline = Instant::now() + TIMEOUT;
    while Instant::now() < deadline {
        if manager.get(&id).is_some_and(|u| u.uploaded > 0) {
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }
    let state = manager.cancel(&id).expect("cancel");
    assert_eq!(state.active_count, 0);

    let last = wait_for_terminal(&rx, &id, TIMEOUT).expect("terminal update");
    assert_eq!(last.status, UploadStatus::Cancelled);
    assert!(manager.cancel(&id).is_err());

    assert!(wait_until_idle(&manager));
    thread::sleep(Duration::from_millis(100));
    assert!(transport.received("big.bin").is_none());
    assert_eq!(manager.get(&id).map(|u| u.status), Some(UploadStatus::Cancelled));
}

fn wait_for_uploaded(manager: &UploadManager, id: &str, at_least: u64) {
    let deadline = Instant::now() + TIMEOUT;
    while Instant::now() < deadline {
        if manager.get(id).is_some_and(|u| u.uploaded >= at_least) {
            return;
        }
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn test_pause_holds_transfer_until_resumed() {
    let transport = Arc::new(SimulatedTransport::new());
    let manager = slow_manager(transport.clone(), 1, 20);
    let rx = manager.subscribe_progress();
    let id = manager
        .enqueue(None, "paused.bin".to_string(), vec![3; 100])
        .expect("enqueue");

    wait_for_uploaded(&manager, &id, 1);
    let paused = manager.pause(&id).expect("pause");
    assert_eq!(paused.status, UploadStatus::Paused);

    thread::sleep(Duration::from_millis(250));
    let held = manager.get(&id).expect("tracked");
    assert_eq!(held.status, UploadStatus::Paused);
    assert_eq!(held.uploaded, paused.uploaded);
    assert!(transport.received("paused.bin").is_none());

    manager.resume(&id).expect("resume");
    let last = wait_for_terminal(&rx, &id, TIMEOUT).expect("terminal update");
    assert_eq!(last.status, UploadStatus::Completed);
    assert_eq!(transport.received("paused.bin").map(|b| b.len()), Some(100));
}

#[test]
fn test_transport_failure_marks_error() {
    let manager = slow_manager(
        Arc::new(SimulatedTransport::failing_after(5, "connection reset")),
        4,
        0,
    );
    let rx = manager.subscribe_progress();
    let id = manager
        .enqueue(None, "a.bin".to_string(), vec![0; 12])
        .expect("enqueue");

    let last = wait_for_terminal(&rx, &id, TIMEOUT).expect("terminal update");
    assert_eq!(last.status, UploadStatus::Error);
    let upload = manager.get(&id).expect("tracked");
    assert_eq!(upload.error.as_deref(), Some("upload failed: connection reset"));
    assert!(upload.uploaded < upload.total);
}

#[test]
fn test_unauthorized_flags_account_for_reauth() {
    let directory = Arc::new(Mutex::new(AccountDirectory::new()));
    directory
        .lock()
        .expect("directory lock")
        .upsert(AccountProfile {
            id: ACCOUNT.to_string(),
            provider_id: PROVIDER.to_string(),
            name: "Alice".to_string(),
            email: Some(ACCOUNT.to_string()),
            picture_url: None,
            needs_reauth: false,
        });
    let manager = UploadManager::with_transport(Arc::new(SimulatedTransport::rejecting_auth()))
        .account(directory.clone(), PROVIDER, ACCOUNT);
    let rx = manager.subscribe_progress();
    let id = manager
        .enqueue(None, "a.bin".to_string(), vec![0; 8])
        .expect("enqueue");

    let last = wait_for_terminal(&rx, &id, TIMEOUT).expect("terminal update");
    assert_eq!(last.status, UploadStatus::Error);
    let needs_reauth = directory
        .lock()
        .expect("directory lock")
        .get(PROVIDER, ACCOUNT)
        .map(|a| a.needs_reauth);
    assert_eq!(needs_reauth, Some(true));
}

#[derive(Default)]
struct ConcurrencyProbe {
    statuses: Mutex<HashMap<String, UploadStatus>>,
    peak: Mutex<usize>,
}

impl ProgressObserver for ConcurrencyProbe {
    fn on_progress(&self, progress: &UploadProgress) {
        let mut statuses = self.statuses.lock().expect("probe lock");
        statuses.insert(progress.id.clone(), progress.status);
        let running = statuses
            .values()
            .filter(|status| **status == UploadStatus::Uploading)
            .count();
        let mut peak = self.peak.lock().expect("probe lock");
        *peak = (*peak).max(running);
    }
}

#[test]
fn test_concurrency_limit_is_respected() {
    let manager = slow_manager(Arc::new(SimulatedTransport::new()), 2, 5).max_concurrency(1);
    let probe = Arc::new(ConcurrencyProbe::default());
    manager.add_observer(probe.clone());

    for name in ["one.bin", "two.bin", "three.bin"] {
        manager
            .enqueue(None, name.to_string(), vec![0; 10])
            .expect("enqueue");
    }
    assert!(wait_until_idle(&manager));

    let snapshot = manager.snapshot();
    assert_eq!(snapshot.uploads.len(), 3);
    assert!(snapshot
        .uploads
        .iter()
        .all(|u| u.status == UploadStatus::Completed));
    assert_eq!(*probe.peak.lock().expect("probe lock"), 1);

    let cleared = manager.clear_finished();
    assert!(cleared.uploads.is_empty());
    assert_eq!(cleared.average_progress, 0.0);
}
