use super::models::{UploadProgress, UploadProgressUpdate, UploadQueueState};
use super::session::{upload_manager, with_session};
use flutter_rust_bridge::frb;
use uuid::Uuid;

#[frb]
pub fn upload_queue_state(session_id: String) -> Result<UploadQueueState, String> {
    Ok(upload_manager(&session_id)?.snapshot())
}

/// 宿主自行上传时登记任务；upload_id 为空时自动生成。返回任务 id。
#[frb]
pub fn start_upload(
    session_id: String,
    upload_id: Option<String>,
    file_name: String,
    parent_id: Option<String>,
    total_bytes: u64,
) -> Result<String, String> {
    let id = upload_id.unwrap_or_else(|| Uuid::new_v4().to_string());
    upload_manager(&session_id)?.start_upload(&id, &file_name, parent_id, total_bytes)?;
    Ok(id)
}

#[frb]
pub fn report_upload_progress(
    session_id: String,
    upload_id: String,
    uploaded_bytes: u64,
) -> Result<Option<UploadProgress>, String> {
    Ok(upload_manager(&session_id)?.report_progress(&upload_id, uploaded_bytes))
}

#[frb]
pub fn report_upload_error(
    session_id: String,
    upload_id: String,
    message: String,
) -> Result<Option<UploadProgress>, String> {
    Ok(upload_manager(&session_id)?.report_error(&upload_id, &message))
}

#[frb]
pub fn pause_upload(session_id: String, upload_id: String) -> Result<Option<UploadProgress>, String> {
    Ok(upload_manager(&session_id)?.pause(&upload_id))
}

#[frb]
pub fn resume_upload(
    session_id: String,
    upload_id: String,
) -> Result<Option<UploadProgress>, String> {
    Ok(upload_manager(&session_id)?.resume(&upload_id))
}

#[frb]
pub fn mark_upload_retrying(
    session_id: String,
    upload_id: String,
) -> Result<Option<UploadProgress>, String> {
    Ok(upload_manager(&session_id)?.mark_retrying(&upload_id))
}

#[frb]
pub fn cancel_upload_task(session_id: String, upload_id: String) -> Result<UploadQueueState, String> {
    upload_manager(&session_id)?.cancel(&upload_id)
}

#[frb]
pub fn remove_upload_task(session_id: String, upload_id: String) -> Result<UploadQueueState, String> {
    Ok(upload_manager(&session_id)?.remove(&upload_id))
}

#[frb]
pub fn clear_finished_uploads(session_id: String) -> Result<UploadQueueState, String> {
    Ok(upload_manager(&session_id)?.clear_finished())
}

/// 调试入口：走内置的模拟传输上传，分片与延迟取自慢速上传设置。
#[frb]
pub fn enqueue_simulated_upload(
    session_id: String,
    parent_id: Option<String>,
    file_name: String,
    content: Vec<u8>,
) -> Result<String, String> {
    upload_manager(&session_id)?.enqueue(parent_id, file_name, content)
}

/// 取走自上次调用以来的全部进度事件。
#[frb]
pub fn drain_upload_progress(session_id: String) -> Result<Vec<UploadProgressUpdate>, String> {
    with_session(&session_id, |handle| handle.progress_rx.try_iter().collect())
}
