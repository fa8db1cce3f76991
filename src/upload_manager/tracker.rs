use crate::api::models::{UploadProgress, UploadQueueState, UploadStatus};

/// 上传进度聚合与状态机。
///
/// 只维护内存中的 `id -> UploadProgress` 表，不做任何 I/O；
/// 所有状态变化都通过下面的方法完成，被拒绝的操作返回 `None` 且不修改状态。
///
/// ```text
/// waiting -> uploading -> completed
///              |-> error
///              |-> paused   -> uploading
///              |-> retrying -> uploading | error
/// 任意非终态 -> cancelled
/// ```
#[derive(Clone, Debug, Default)]
pub struct UploadTracker {
    uploads: Vec<UploadProgress>,
}

impl UploadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&UploadProgress> {
        self.uploads.iter().find(|u| u.id == id)
    }

    /// 按开始顺序排列的全部任务。
    pub fn uploads(&self) -> &[UploadProgress] {
        &self.uploads
    }

    pub fn len(&self) -> usize {
        self.uploads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uploads.is_empty()
    }

    /// 新建一个正在上传的任务（uploaded = 0）。
    pub fn start_upload(
        &mut self,
        id: &str,
        file_name: &str,
        parent_id: Option<String>,
        total: u64,
    ) -> Option<UploadProgress> {
        self.insert(id, file_name, parent_id, total, UploadStatus::Uploading)
    }

    /// 新建一个排队中的任务，等待 `begin` 后才开始计入字节。
    pub fn enqueue(
        &mut self,
        id: &str,
        file_name: &str,
        parent_id: Option<String>,
        total: u64,
    ) -> Option<UploadProgress> {
        self.insert(id, file_name, parent_id, total, UploadStatus::Waiting)
    }

    fn insert(
        &mut self,
        id: &str,
        file_name: &str,
        parent_id: Option<String>,
        total: u64,
        status: UploadStatus,
    ) -> Option<UploadProgress> {
        if let Some(pos) = self.uploads.iter().position(|u| u.id == id) {
            if self.uploads[pos].status.is_active() {
                log::warn!("[upload-tracker] upload {id} is already active; ignoring start");
                return None;
            }
            self.uploads.remove(pos);
        }
        let progress = UploadProgress {
            id: id.to_string(),
            file_name: file_name.to_string(),
            parent_id,
            uploaded: 0,
            total,
            status,
            error: None,
            speed_bps: None,
        };
        self.uploads.push(progress.clone());
        Some(progress)
    }

    pub fn begin(&mut self, id: &str) -> Option<UploadProgress> {
        self.transition(
            id,
            |status| status == UploadStatus::Waiting,
            |u| u.status = UploadStatus::Uploading,
        )
    }

    /// 更新已上传字节数。达到 total 即视为完成，不需要额外的完成信号。
    /// 排队或重试中的任务收到进度会回到 uploading；暂停或已结束的任务忽略进度。
    pub fn report_progress(&mut self, id: &str, uploaded: u64) -> Option<UploadProgress> {
        self.transition(
            id,
            |status| {
                matches!(
                    status,
                    UploadStatus::Waiting | UploadStatus::Uploading | UploadStatus::Retrying
                )
            },
            |u| {
                u.uploaded = uploaded;
                u.status = if uploaded >= u.total {
                    UploadStatus::Completed
                } else {
                    UploadStatus::Uploading
                };
            },
        )
    }

    /// 传输层在上传过程中才得知准确大小时使用。
    pub fn update_total(&mut self, id: &str, total: u64) -> Option<UploadProgress> {
        self.transition(id, UploadStatus::is_active, |u| u.total = total)
    }

    /// 任何非终态都可以失败：排队中读取文件失败、暂停期间连接断开都直接进入 error。
    pub fn report_error(&mut self, id: &str, message: &str) -> Option<UploadProgress> {
        self.transition(id, UploadStatus::is_active, |u| {
            u.status = UploadStatus::Error;
            u.error = Some(message.to_string());
            u.speed_bps = None;
        })
    }

    pub fn cancel(&mut self, id: &str) -> Option<UploadProgress> {
        self.transition(id, UploadStatus::is_active, |u| {
            u.status = UploadStatus::Cancelled;
            u.speed_bps = None;
        })
    }

    pub fn pause(&mut self, id: &str) -> Option<UploadProgress> {
        self.transition(
            id,
            |status| status == UploadStatus::Uploading,
            |u| {
                u.status = UploadStatus::Paused;
                u.speed_bps = None;
            },
        )
    }

    pub fn resume(&mut self, id: &str) -> Option<UploadProgress> {
        self.transition(
            id,
            |status| matches!(status, UploadStatus::Paused | UploadStatus::Retrying),
            |u| u.status = UploadStatus::Uploading,
        )
    }

    pub fn mark_retrying(&mut self, id: &str) -> Option<UploadProgress> {
        self.transition(
            id,
            |status| status == UploadStatus::Uploading,
            |u| {
                u.status = UploadStatus::Retrying;
                u.speed_bps = None;
            },
        )
    }

    /// 速度由调用方根据时间采样计算，这里只负责记录。
    pub fn set_speed(&mut self, id: &str, speed_bps: Option<f64>) -> Option<UploadProgress> {
        self.transition(
            id,
            |status| status == UploadStatus::Uploading,
            |u| u.speed_bps = speed_bps,
        )
    }

    /// 移除任意状态的任务。
    pub fn remove(&mut self, id: &str) -> Option<UploadProgress> {
        let pos = self.uploads.iter().position(|u| u.id == id)?;
        Some(self.uploads.remove(pos))
    }

    /// 清除所有终态任务，返回清除数量；重复调用无副作用。
    pub fn clear_finished(&mut self) -> usize {
        let before = self.uploads.len();
        self.uploads.retain(|u| u.status.is_active());
        before - self.uploads.len()
    }

    pub fn active_count(&self) -> usize {
        self.uploads.iter().filter(|u| u.status.is_active()).count()
    }

    /// 非终态且 total > 0 的任务的平均完成比例；没有可计入的任务时为 0。
    pub fn average_progress(&self) -> f64 {
        let fractions: Vec<f64> = self
            .uploads
            .iter()
            .filter(|u| u.status.is_active())
            .filter_map(UploadProgress::fraction)
            .collect();
        if fractions.is_empty() {
            return 0.0;
        }
        fractions.iter().sum::<f64>() / fractions.len() as f64
    }

    pub fn snapshot(&self) -> UploadQueueState {
        UploadQueueState {
            uploads: self.uploads.clone(),
            active_count: self.active_count(),
            average_progress: self.average_progress(),
        }
    }

    fn transition<A, F>(&mut self, id: &str, allowed: A, apply: F) -> Option<UploadProgress>
    where
        A: Fn(UploadStatus) -> bool,
        F: FnOnce(&mut UploadProgress),
    {
        let upload = self.uploads.iter_mut().find(|u| u.id == id)?;
        if !allowed(upload.status) {
            log::debug!(
                "[upload-tracker] rejected transition for {id} in state {:?}",
                upload.status
            );
            return None;
        }
        apply(upload);
        Some(upload.clone())
    }
}
