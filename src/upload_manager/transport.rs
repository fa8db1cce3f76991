use super::chunker::{Chunk, ChunkStream};
use crate::api::models::DriveItemSummary;
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// 上传开始时交给传输层的控制信号（取消与暂停）。
/// `UploadManager` 只负责置位，传输层需要自行轮询：取消后停止发送，暂停期间不再交出分片。
#[derive(Clone, Debug, Default)]
pub struct TransferControl {
    cancelled: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
}

impl TransferControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::Relaxed);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::Relaxed);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    /// 暂停期间阻塞；返回 false 表示等待中被取消。
    pub fn wait_while_paused(&self) -> bool {
        while self.is_paused() {
            if self.is_cancelled() {
                return false;
            }
            thread::sleep(PAUSE_POLL_INTERVAL);
        }
        !self.is_cancelled()
    }
}

/// 传输层在上报进度时所处的阶段。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferPhase {
    Uploading,
    Retrying,
    Paused,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferEvent {
    pub uploaded: u64,
    pub total: u64,
    pub phase: TransferPhase,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("upload cancelled")]
    Cancelled,
    #[error("access token rejected by provider; please sign in again")]
    Unauthorized,
    #[error("upload failed: {0}")]
    Failed(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadRequest {
    pub file_name: String,
    pub parent_id: Option<String>,
    pub total: u64,
}

/// 外部 provider 的上传实现（OneDrive、Google Drive 等）。
/// 核心层只消费它产生的进度事件，不关心具体的网络协议。
pub trait UploadTransport: Send + Sync {
    fn upload(
        &self,
        request: &UploadRequest,
        source: ChunkStream,
        control: &TransferControl,
        progress: &mut dyn FnMut(TransferEvent),
    ) -> Result<DriveItemSummary, TransferError>;
}

/// 对分片流做进度回调、暂停与取消检测的适配器。
/// 每交出一个分片就回调一次累计字节数；暂停时阻塞到恢复，发现取消后返回一次 `Cancelled` 并结束。
pub struct ProgressChunks<'a> {
    inner: ChunkStream,
    sent: u64,
    total: u64,
    control: &'a TransferControl,
    progress: &'a mut dyn FnMut(TransferEvent),
    finished: bool,
}

impl<'a> ProgressChunks<'a> {
    pub fn new(
        inner: ChunkStream,
        total: u64,
        control: &'a TransferControl,
        progress: &'a mut dyn FnMut(TransferEvent),
    ) -> Self {
        Self {
            inner,
            sent: 0,
            total,
            control,
            progress,
            finished: false,
        }
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }
}

impl Iterator for ProgressChunks<'_> {
    type Item = Result<Chunk, TransferError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if !self.control.wait_while_paused() {
            self.finished = true;
            return Some(Err(TransferError::Cancelled));
        }
        let chunk = self.inner.next()?;
        self.sent = self.sent.saturating_add(chunk.data.len() as u64);
        (self.progress)(TransferEvent {
            uploaded: self.sent,
            total: self.total,
            phase: TransferPhase::Uploading,
        });
        Some(Ok(chunk))
    }
}

#[derive(Clone, Debug)]
enum SimulatedFailure {
    AfterBytes { bytes: u64, message: String },
    Unauthorized,
}

/// 不走网络的调试传输：把分片收进内存，每个分片后上报一次进度。
/// 配合 `FixedSizeChunker` 使用即可模拟慢速上传。
#[derive(Default)]
pub struct SimulatedTransport {
    received: Mutex<HashMap<String, Vec<u8>>>,
    failure: Option<SimulatedFailure>,
}

impl SimulatedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 累计发送超过 `bytes` 后以 `message` 失败。
    pub fn failing_after(bytes: u64, message: impl Into<String>) -> Self {
        Self {
            received: Mutex::new(HashMap::new()),
            failure: Some(SimulatedFailure::AfterBytes {
                bytes,
                message: message.into(),
            }),
        }
    }

    /// 模拟 401：令牌失效。
    pub fn rejecting_auth() -> Self {
        Self {
            received: Mutex::new(HashMap::new()),
            failure: Some(SimulatedFailure::Unauthorized),
        }
    }

    /// 已完整接收的文件内容。
    pub fn received(&self, file_name: &str) -> Option<Vec<u8>> {
        self.received
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(file_name)
            .cloned()
    }
}

impl UploadTransport for SimulatedTransport {
    fn upload(
        &self,
        request: &UploadRequest,
        source: ChunkStream,
        control: &TransferControl,
        progress: &mut dyn FnMut(TransferEvent),
    ) -> Result<DriveItemSummary, TransferError> {
        if let Some(SimulatedFailure::Unauthorized) = self.failure {
            return Err(TransferError::Unauthorized);
        }
        let fail_after = match &self.failure {
            Some(SimulatedFailure::AfterBytes { bytes, message }) => {
                Some((*bytes, message.clone()))
            }
            _ => None,
        };

        let mut buffer = Vec::with_capacity(request.total as usize);
        let mut chunks = ProgressChunks::new(source, request.total, control, progress);
        for chunk in chunks.by_ref() {
            let chunk = chunk?;
            buffer.extend_from_slice(&chunk.data);
            if let Some((limit, message)) = &fail_after {
                if buffer.len() as u64 > *limit {
                    return Err(TransferError::Failed(message.clone()));
                }
            }
        }
        log::debug!(
            "[simulated-transport] received {} bytes for {}",
            chunks.sent(),
            request.file_name
        );

        let size = buffer.len() as u64;
        self.received
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(request.file_name.clone(), buffer);

        Ok(DriveItemSummary {
            id: format!("sim-{}", Uuid::new_v4()),
            name: request.file_name.clone(),
            size: Some(size),
            is_folder: false,
            child_count: None,
            mime_type: None,
            last_modified: None,
            thumbnail_url: None,
        })
    }
}
