use crate::api::models::UploadProgressUpdate;
use crate::db::Database;
use crate::logging::init_logging;
use crate::navigation::NavigationManager;
use crate::settings::{load_upload_settings, UploadSettings};
use crate::upload_manager::{SimulatedTransport, UploadManager};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{mpsc::Receiver, Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// 每个宿主界面（一次文件选择/浏览会话）对应一个句柄，互不共享状态。
static SESSIONS: Lazy<Mutex<HashMap<String, SessionHandle>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

pub(crate) struct SessionHandle {
    pub(crate) navigation: NavigationManager,
    pub(crate) uploads: UploadManager,
    pub(crate) progress_rx: Receiver<UploadProgressUpdate>,
}

impl SessionHandle {
    fn new(root_label: String, database: Option<&Database>) -> Self {
        let uploads = build_upload_manager(database);
        let progress_rx = uploads.subscribe_progress();
        Self {
            navigation: NavigationManager::with_root_label(root_label),
            uploads,
            progress_rx,
        }
    }
}

/// 按持久化设置构造上传管理器；没有设置存储或读取失败时退回默认值。
fn build_upload_manager(database: Option<&Database>) -> UploadManager {
    let settings = database
        .map(load_upload_settings)
        .transpose()
        .unwrap_or_else(|err| {
            log::warn!("[session] failed to read upload settings: {err}");
            None
        })
        .unwrap_or_default();
    let UploadSettings {
        max_concurrency,
        throttle,
    } = settings;

    UploadManager::with_transport(Arc::new(SimulatedTransport::new()))
        .chunker(throttle.chunker())
        .max_concurrency(max_concurrency)
}

fn sessions() -> MutexGuard<'static, HashMap<String, SessionHandle>> {
    SESSIONS.lock().unwrap_or_else(|p| p.into_inner())
}

/// 在持有注册表锁的情况下访问会话；只用于纯内存操作。
pub(crate) fn with_session<T>(
    session_id: &str,
    operation: impl FnOnce(&mut SessionHandle) -> T,
) -> Result<T, String> {
    let mut sessions = sessions();
    let handle = sessions
        .get_mut(session_id)
        .ok_or_else(|| format!("unknown session {session_id}"))?;
    Ok(operation(handle))
}

/// 取出上传管理器的克隆，在锁外执行可能触发回调的操作。
pub(crate) fn upload_manager(session_id: &str) -> Result<UploadManager, String> {
    with_session(session_id, |handle| handle.uploads.clone())
}

/// 创建一个新的浏览会话并返回其 id。`root_label` 为根目录的显示名称。
#[flutter_rust_bridge::frb]
pub fn create_browser_session(root_label: String) -> String {
    init_logging();
    let database = match Database::open_default() {
        Ok(db) => Some(db),
        Err(err) => {
            log::warn!("[session] settings storage unavailable, using defaults: {err}");
            None
        }
    };
    open_session(root_label, database.as_ref())
}

/// 使用指定的设置数据库创建会话，便于嵌入方或测试隔离平台数据目录。
#[flutter_rust_bridge::frb(ignore)]
pub fn create_browser_session_with_database(root_label: String, database: &Database) -> String {
    init_logging();
    open_session(root_label, Some(database))
}

fn open_session(root_label: String, database: Option<&Database>) -> String {
    let session_id = Uuid::new_v4().to_string();
    let handle = SessionHandle::new(root_label, database);
    sessions().insert(session_id.clone(), handle);
    log::info!("[session] opened {session_id}");
    session_id
}

/// 关闭会话；进行中的上传会收到取消信号。
#[flutter_rust_bridge::frb]
pub fn close_browser_session(session_id: String) -> Result<(), String> {
    let handle = sessions()
        .remove(&session_id)
        .ok_or_else(|| format!("unknown session {session_id}"))?;
    let active: Vec<String> = handle
        .uploads
        .snapshot()
        .uploads
        .into_iter()
        .filter(|u| u.status.is_active())
        .map(|u| u.id)
        .collect();
    for id in active {
        let _ = handle.uploads.cancel(&id);
    }
    log::info!("[session] closed {session_id}");
    Ok(())
}
