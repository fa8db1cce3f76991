use super::chunker::{Chunker, WholeBufferChunker};
use super::tracker::UploadTracker;
use super::transport::{
    TransferControl, TransferError, TransferEvent, TransferPhase, UploadRequest, UploadTransport,
};
use crate::accounts::AccountDirectory;
use crate::api::models::{UploadProgress, UploadProgressUpdate, UploadQueueState, UploadStatus};
use std::{
    collections::{HashMap, HashSet},
    sync::{
        mpsc::{self, Receiver, SyncSender, TrySendError},
        Arc, Condvar, Mutex, MutexGuard,
    },
    thread,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};
use uuid::Uuid;

const PROGRESS_CHANNEL_CAP: usize = 64;
const SPEED_SAMPLE_MIN_INTERVAL: Duration = Duration::from_millis(300);
pub const DEFAULT_MAX_CONCURRENCY: usize = 2;

/// 进度观察者：每次任务状态或字节数变化后回调，回调时不持有内部锁。
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, progress: &UploadProgress);
}

/// 上传驱动：在 `UploadTracker` 之上负责线程调度、并发限制、取消信号、
/// 速度采样与事件广播。
///
/// 两种用法：
/// - 宿主自行上传，通过 `start_upload` / `report_progress` 等方法喂入事件；
/// - 配置了 `UploadTransport` 时，`enqueue` 会在后台线程里完成整个上传。
#[derive(Clone)]
pub struct UploadManager {
    tracker: Arc<Mutex<UploadTracker>>,
    transport: Option<Arc<dyn UploadTransport>>,
    chunker: Arc<dyn Chunker>,
    account: Option<AccountBinding>,
    progress_meters: Arc<Mutex<HashMap<String, ProgressTick>>>,
    subscribers: Arc<Mutex<Vec<SyncSender<UploadProgressUpdate>>>>,
    observers: Arc<Mutex<Vec<Arc<dyn ProgressObserver>>>>,
    controls: Arc<Mutex<HashMap<String, TransferControl>>>,
    concurrency_guard: Arc<Semaphore>,
}

#[derive(Clone)]
struct AccountBinding {
    directory: Arc<Mutex<AccountDirectory>>,
    provider_id: String,
    account_id: String,
}

#[derive(Clone)]
struct ProgressTick {
    uploaded: u64,
    instant: Instant,
}

impl Default for UploadManager {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadManager {
    /// 仅由宿主驱动的管理器，没有内置传输层。
    pub fn new() -> Self {
        Self {
            tracker: Arc::new(Mutex::new(UploadTracker::new())),
            transport: None,
            chunker: Arc::new(WholeBufferChunker),
            account: None,
            progress_meters: Arc::new(Mutex::new(HashMap::new())),
            subscribers: Arc::new(Mutex::new(Vec::new())),
            observers: Arc::new(Mutex::new(Vec::new())),
            controls: Arc::new(Mutex::new(HashMap::new())),
            concurrency_guard: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENCY)),
        }
    }

    pub fn with_transport(transport: Arc<dyn UploadTransport>) -> Self {
        Self {
            transport: Some(transport),
            ..Self::new()
        }
    }

    /// 替换分片策略（例如调试时的慢速分片）。
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = chunker;
        self
    }

    pub fn max_concurrency(mut self, max: usize) -> Self {
        self.concurrency_guard = Arc::new(Semaphore::new(max.max(1)));
        self
    }

    /// 绑定所属账号；传输层报告鉴权失败时会把该账号标记为需要重新登录。
    pub fn account(
        mut self,
        directory: Arc<Mutex<AccountDirectory>>,
        provider_id: &str,
        account_id: &str,
    ) -> Self {
        self.account = Some(AccountBinding {
            directory,
            provider_id: provider_id.to_string(),
            account_id: account_id.to_string(),
        });
        self
    }

    pub fn add_observer(&self, observer: Arc<dyn ProgressObserver>) {
        recover_lock(&self.observers).push(observer);
    }

    /// 宿主自行上传时调用；返回的控制信号需要交给宿主的传输层。
    pub fn start_upload(
        &self,
        id: &str,
        file_name: &str,
        parent_id: Option<String>,
        total: u64,
    ) -> Result<TransferControl, String> {
        let started = recover_lock(&self.tracker).start_upload(id, file_name, parent_id, total);
        let Some(progress) = started else {
            return Err(format!("upload {id} is already in progress"));
        };
        let control = TransferControl::new();
        self.register_control(id, control.clone());
        self.notify(&progress);
        Ok(control)
    }

    /// 入队并在后台线程中上传，返回新任务的 id。
    pub fn enqueue(
        &self,
        parent_id: Option<String>,
        file_name: String,
        bytes: Vec<u8>,
    ) -> Result<String, String> {
        if file_name.trim().is_empty() {
            return Err("file name is required".to_string());
        }
        let transport = self
            .transport
            .clone()
            .ok_or_else(|| "no upload transport configured".to_string())?;

        let total = bytes.len() as u64;
        let upload_id = Uuid::new_v4().to_string();
        let mut tracker = recover_lock(&self.tracker);
        if tracker.uploads().iter().any(|u| {
            u.status.is_active() && u.file_name == file_name && u.parent_id == parent_id
        }) {
            return Err("同名文件已在上传队列中".to_string());
        }
        let queued = tracker.enqueue(&upload_id, &file_name, parent_id.clone(), total);
        drop(tracker);
        if let Some(progress) = queued {
            self.notify(&progress);
        }

        let control = TransferControl::new();
        self.register_control(&upload_id, control.clone());

        let manager = self.clone();
        let task_id = upload_id.clone();
        thread::spawn(move || {
            let _permit = manager.concurrency_guard.acquire();
            if control.is_cancelled() {
                manager.clear_control(&task_id);
                return;
            }
            let begun = recover_lock(&manager.tracker).begin(&task_id);
            match begun {
                Some(progress) => manager.notify(&progress),
                None => {
                    manager.clear_control(&task_id);
                    return;
                }
            }

            let request = UploadRequest {
                file_name,
                parent_id,
                total,
            };
            let source = manager.chunker.chunks(bytes.into());
            let progress_manager = manager.clone();
            let progress_id = task_id.clone();
            let mut on_event = move |event: TransferEvent| {
                progress_manager.apply_transfer_event(&progress_id, event);
            };
            let result = transport.upload(&request, source, &control, &mut on_event);
            match result {
                Ok(item) => {
                    log::info!(
                        "[upload-manager] {} uploaded as {} ({} bytes)",
                        request.file_name,
                        item.id,
                        total
                    );
                    manager.report_progress(&task_id, total);
                }
                Err(TransferError::Cancelled) => {
                    manager.cancel_tracked(&task_id);
                }
                Err(err) => {
                    if err == TransferError::Unauthorized {
                        manager.flag_account_for_reauth();
                    }
                    manager.report_error(&task_id, &err.to_string());
                }
            }
            manager.clear_control(&task_id);
        });

        Ok(upload_id)
    }

    fn apply_transfer_event(&self, id: &str, event: TransferEvent) {
        match event.phase {
            TransferPhase::Uploading => {
                let mut tracker = recover_lock(&self.tracker);
                let Some(current) = tracker.get(id).cloned() else {
                    return;
                };
                if current.status == UploadStatus::Paused {
                    log::debug!("[upload-manager] dropping progress for paused upload {id}");
                    return;
                }
                if current.total != event.total {
                    tracker.update_total(id, event.total);
                }
                drop(tracker);
                self.report_progress(id, event.uploaded);
            }
            TransferPhase::Retrying => {
                let updated = recover_lock(&self.tracker).mark_retrying(id);
                if let Some(progress) = updated {
                    log::info!("[upload-manager] retrying upload {id}");
                    self.notify(&progress);
                }
            }
            TransferPhase::Paused => {
                self.pause(id);
            }
        }
    }

    /// 更新进度，到达总字节数即完成。
    pub fn report_progress(&self, id: &str, uploaded: u64) -> Option<UploadProgress> {
        let mut tracker = recover_lock(&self.tracker);
        let mut updated = tracker.report_progress(id, uploaded)?;
        if updated.status == UploadStatus::Uploading {
            if let Some(speed) = self.compute_speed_bps(id, uploaded) {
                if let Some(with_speed) = tracker.set_speed(id, Some(speed)) {
                    updated = with_speed;
                }
            }
        }
        drop(tracker);
        if updated.status.is_terminal() {
            self.clear_progress_meter(id);
            self.clear_control(id);
        }
        self.notify(&updated);
        Some(updated)
    }

    pub fn report_error(&self, id: &str, message: &str) -> Option<UploadProgress> {
        let updated = recover_lock(&self.tracker).report_error(id, message)?;
        log::warn!("[upload-manager] upload {id} failed: {message}");
        self.clear_progress_meter(id);
        self.clear_control(id);
        self.notify(&updated);
        Some(updated)
    }

    /// 标记取消并通知传输层停止；任务不存在或已结束时返回错误。
    pub fn cancel(&self, id: &str) -> Result<UploadQueueState, String> {
        self.signal_cancel(id);
        if self.cancel_tracked(id).is_some() {
            Ok(self.snapshot())
        } else {
            Err("未找到对应的上传任务或已结束".to_string())
        }
    }

    fn cancel_tracked(&self, id: &str) -> Option<UploadProgress> {
        let updated = recover_lock(&self.tracker).cancel(id)?;
        self.clear_progress_meter(id);
        self.notify(&updated);
        Some(updated)
    }

    /// 暂停：传输层在下一个分片前阻塞，期间的进度事件被丢弃。
    pub fn pause(&self, id: &str) -> Option<UploadProgress> {
        let updated = recover_lock(&self.tracker).pause(id)?;
        if let Some(control) = recover_lock(&self.controls).get(id) {
            control.pause();
        }
        self.clear_progress_meter(id);
        self.notify(&updated);
        Some(updated)
    }

    pub fn resume(&self, id: &str) -> Option<UploadProgress> {
        let updated = recover_lock(&self.tracker).resume(id)?;
        if let Some(control) = recover_lock(&self.controls).get(id) {
            control.resume();
        }
        self.notify(&updated);
        Some(updated)
    }

    pub fn mark_retrying(&self, id: &str) -> Option<UploadProgress> {
        let updated = recover_lock(&self.tracker).mark_retrying(id)?;
        self.notify(&updated);
        Some(updated)
    }

    /// 移除任意状态的任务；进行中的任务会先收到取消信号。
    pub fn remove(&self, id: &str) -> UploadQueueState {
        self.signal_cancel(id);
        let mut tracker = recover_lock(&self.tracker);
        tracker.remove(id);
        let snapshot = tracker.snapshot();
        drop(tracker);
        self.clear_progress_meter(id);
        self.clear_control(id);
        snapshot
    }

    /// 清除已完成/失败/取消的任务；进行中的任务保持不变。
    pub fn clear_finished(&self) -> UploadQueueState {
        let mut tracker = recover_lock(&self.tracker);
        let removed = tracker.clear_finished();
        let snapshot = tracker.snapshot();
        drop(tracker);
        if removed > 0 {
            log::debug!("[upload-manager] cleared {removed} finished uploads");
        }
        self.prune_inactive_meters(&snapshot.uploads);
        snapshot
    }

    pub fn snapshot(&self) -> UploadQueueState {
        recover_lock(&self.tracker).snapshot()
    }

    pub fn get(&self, id: &str) -> Option<UploadProgress> {
        recover_lock(&self.tracker).get(id).cloned()
    }

    pub fn active_count(&self) -> usize {
        recover_lock(&self.tracker).active_count()
    }

    pub fn average_progress(&self) -> f64 {
        recover_lock(&self.tracker).average_progress()
    }

    /// 新的订阅通道；订阅时会先补发所有进行中任务的当前进度。
    pub fn subscribe_progress(&self) -> Receiver<UploadProgressUpdate> {
        let (tx, rx) = mpsc::sync_channel(PROGRESS_CHANNEL_CAP);
        recover_lock(&self.subscribers).push(tx.clone());

        let tracker = recover_lock(&self.tracker);
        for upload in tracker.uploads().iter().filter(|u| u.status.is_active()) {
            let _ = tx.try_send(update_from(upload));
        }
        rx
    }

    fn notify(&self, progress: &UploadProgress) {
        let update = update_from(progress);
        recover_lock(&self.subscribers).retain_mut(|sender| {
            match sender.try_send(update.clone()) {
                Ok(_) => true,
                Err(TrySendError::Full(_)) => true,
                Err(TrySendError::Disconnected(_)) => false,
            }
        });
        let observers = recover_lock(&self.observers).clone();
        for observer in observers {
            observer.on_progress(progress);
        }
    }

    fn compute_speed_bps(&self, id: &str, uploaded: u64) -> Option<f64> {
        let now = Instant::now();
        let mut meters = recover_lock(&self.progress_meters);
        let entry = meters.entry(id.to_string()).or_insert_with(|| ProgressTick {
            uploaded,
            instant: now,
        });
        let delta_bytes = uploaded.saturating_sub(entry.uploaded);
        let elapsed = now.duration_since(entry.instant);
        if delta_bytes == 0 || elapsed < SPEED_SAMPLE_MIN_INTERVAL {
            return None;
        }
        entry.uploaded = uploaded;
        entry.instant = now;
        Some(delta_bytes as f64 / elapsed.as_secs_f64())
    }

    fn clear_progress_meter(&self, id: &str) {
        recover_lock(&self.progress_meters).remove(id);
    }

    fn prune_inactive_meters(&self, uploads: &[UploadProgress]) {
        let active_ids: HashSet<&str> = uploads
            .iter()
            .filter(|u| u.status.is_active())
            .map(|u| u.id.as_str())
            .collect();
        recover_lock(&self.progress_meters).retain(|id, _| active_ids.contains(id.as_str()));
    }

    fn register_control(&self, id: &str, control: TransferControl) {
        recover_lock(&self.controls).insert(id.to_string(), control);
    }

    fn clear_control(&self, id: &str) {
        recover_lock(&self.controls).remove(id);
    }

    fn signal_cancel(&self, id: &str) -> bool {
        if let Some(control) = recover_lock(&self.controls).get(id) {
            control.cancel();
            return true;
        }
        false
    }

    fn flag_account_for_reauth(&self) {
        if let Some(binding) = &self.account {
            log::warn!(
                "[upload-manager] account {}/{} rejected by provider; reauthentication required",
                binding.provider_id,
                binding.account_id
            );
            recover_lock(&binding.directory)
                .mark_needs_reauth(&binding.provider_id, &binding.account_id);
        }
    }
}

fn update_from(progress: &UploadProgress) -> UploadProgressUpdate {
    UploadProgressUpdate {
        id: progress.id.clone(),
        uploaded: progress.uploaded,
        total: progress.total,
        status: progress.status,
        speed_bps: progress.speed_bps,
        timestamp_millis: current_timestamp(),
    }
}

fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as i64)
        .unwrap_or_default()
}

fn recover_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poison) => {
            log::warn!("[upload-manager] lock poisoned; recovering");
            poison.into_inner()
        }
    }
}

/// 限制同时进行的上传数量。
struct Semaphore {
    state: Mutex<SemaphoreState>,
    cvar: Condvar,
}

struct SemaphoreState {
    available: usize,
    max: usize,
}

impl Semaphore {
    fn new(max: usize) -> Self {
        Self {
            state: Mutex::new(SemaphoreState {
                available: max,
                max,
            }),
            cvar: Condvar::new(),
        }
    }

    fn acquire(&self) -> SemaphorePermit<'_> {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        while state.available == 0 {
            state = self.cvar.wait(state).unwrap_or_else(|p| p.into_inner());
        }
        state.available -= 1;
        SemaphorePermit { semaphore: self }
    }

    fn release(&self) {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        if state.available < state.max {
            state.available += 1;
            self.cvar.notify_one();
        }
    }
}

struct SemaphorePermit<'a> {
    semaphore: &'a Semaphore,
}

impl Drop for SemaphorePermit<'_> {
    fn drop(&mut self) {
        self.semaphore.release();
    }
}
