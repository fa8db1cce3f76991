use super::session::with_session;
use crate::navigation::{BreadcrumbItem, NavigationEntry};

/// 渲染导航栏所需的一致性快照。
#[flutter_rust_bridge::frb]
#[derive(Clone, Debug)]
pub struct NavigationState {
    pub entries: Vec<NavigationEntry>,
    pub current_index: Option<u32>,
    pub current: Option<NavigationEntry>,
    pub can_go_back: bool,
    pub can_go_forward: bool,
    pub breadcrumbs: Vec<BreadcrumbItem>,
}

#[flutter_rust_bridge::frb]
pub fn navigation_state(session_id: String, home_label: String) -> Result<NavigationState, String> {
    with_session(&session_id, |handle| {
        let history = handle.navigation.history();
        NavigationState {
            entries: history.entries().to_vec(),
            current_index: history.current_index().map(|index| index as u32),
            current: history.current().cloned(),
            can_go_back: history.can_go_back(),
            can_go_forward: history.can_go_forward(),
            breadcrumbs: handle.navigation.breadcrumbs(&home_label),
        }
    })
}

/// 进入文件夹；folder_id 为空表示回到根目录（相对导航，仅截断前进历史）。
#[flutter_rust_bridge::frb]
pub fn navigate_to_folder(
    session_id: String,
    folder_id: Option<String>,
    folder_name: String,
    provider_id: String,
    account_id: String,
) -> Result<NavigationEntry, String> {
    with_session(&session_id, |handle| {
        handle
            .navigation
            .navigate_to_folder(folder_id, folder_name, &provider_id, &account_id)
    })
}

#[flutter_rust_bridge::frb]
pub fn go_home(
    session_id: String,
    provider_id: String,
    account_id: String,
) -> Result<NavigationEntry, String> {
    with_session(&session_id, |handle| {
        handle.navigation.go_home(&provider_id, &account_id)
    })
}

#[flutter_rust_bridge::frb]
pub fn go_back(session_id: String) -> Result<Option<NavigationEntry>, String> {
    with_session(&session_id, |handle| handle.navigation.go_back())
}

#[flutter_rust_bridge::frb]
pub fn go_forward(session_id: String) -> Result<Option<NavigationEntry>, String> {
    with_session(&session_id, |handle| handle.navigation.go_forward())
}

#[flutter_rust_bridge::frb]
pub fn navigate_to_index(session_id: String, index: u32) -> Result<Option<NavigationEntry>, String> {
    with_session(&session_id, |handle| {
        handle.navigation.navigate_to_index(index as usize)
    })
}

#[flutter_rust_bridge::frb]
pub fn navigate_to_breadcrumb(
    session_id: String,
    item: BreadcrumbItem,
) -> Result<Option<NavigationEntry>, String> {
    with_session(&session_id, |handle| {
        handle.navigation.navigate_to_breadcrumb(&item)
    })
}

/// 切换 provider 或账号时调用。
#[flutter_rust_bridge::frb]
pub fn clear_navigation_history(session_id: String) -> Result<(), String> {
    with_session(&session_id, |handle| handle.navigation.clear_history())
}
