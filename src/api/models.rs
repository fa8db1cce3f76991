/// 与 Flutter 侧共享的云盘文件/文件夹摘要结构。
/// 由外部的 provider 客户端填充，核心层只透传。
#[flutter_rust_bridge::frb]
#[derive(Clone, Debug, PartialEq)]
pub struct DriveItemSummary {
    pub id: String,
    pub name: String,
    pub size: Option<u64>,
    pub is_folder: bool,
    pub child_count: Option<i64>,
    pub mime_type: Option<String>,
    pub last_modified: Option<String>,
    pub thumbnail_url: Option<String>,
}

/// 列表接口的分页结果，包含子项与 next_link。
#[flutter_rust_bridge::frb]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrivePage {
    pub items: Vec<DriveItemSummary>,
    pub next_link: Option<String>,
}

/// 单个上传任务的状态。
/// completed / error / cancelled 为终态，进入后不再变化。
#[flutter_rust_bridge::frb]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UploadStatus {
    Waiting,
    Uploading,
    Completed,
    Error,
    Cancelled,
    Paused,
    Retrying,
}

impl UploadStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error | Self::Cancelled)
    }

    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }
}

/// 上传进度快照；对外只读，所有修改都经由 `UploadTracker`。
#[flutter_rust_bridge::frb]
#[derive(Clone, Debug, PartialEq)]
pub struct UploadProgress {
    pub id: String,
    pub file_name: String,
    pub parent_id: Option<String>,
    pub uploaded: u64,
    pub total: u64,
    pub status: UploadStatus,
    pub error: Option<String>,
    pub speed_bps: Option<f64>,
}

impl UploadProgress {
    pub fn is_complete(&self) -> bool {
        self.status == UploadStatus::Completed
    }

    /// 已上传比例，限制在 [0, 1]；total 为 0 时无意义，返回 `None`。
    pub fn fraction(&self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        Some((self.uploaded as f64 / self.total as f64).clamp(0.0, 1.0))
    }
}

/// 推送给订阅者的增量进度事件。
#[flutter_rust_bridge::frb]
#[derive(Clone, Debug, PartialEq)]
pub struct UploadProgressUpdate {
    pub id: String,
    pub uploaded: u64,
    pub total: u64,
    pub status: UploadStatus,
    pub speed_bps: Option<f64>,
    pub timestamp_millis: i64,
}

/// 上传队列的一致性快照，供 UI 一次性渲染列表与总进度条。
#[flutter_rust_bridge::frb]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UploadQueueState {
    pub uploads: Vec<UploadProgress>,
    pub active_count: usize,
    pub average_progress: f64,
}
