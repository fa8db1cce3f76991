use super::breadcrumb::{build_breadcrumbs, BreadcrumbItem};
use super::history::{NavigationEntry, NavigationHistory, PathSegment};

const DEFAULT_ROOT_LABEL: &str = "Home";

/// 文件夹导航状态机：前进/后退、面包屑跳转、进入子文件夹。
/// 所有操作都是纯内存修改，无效请求返回 `None` 而不是报错。
#[derive(Clone, Debug)]
pub struct NavigationManager {
    history: NavigationHistory,
    root_label: String,
}

impl Default for NavigationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationManager {
    pub fn new() -> Self {
        Self::with_root_label(DEFAULT_ROOT_LABEL)
    }

    /// 根目录记录使用的显示名称（本地化由 UI 层传入）。
    pub fn with_root_label(root_label: impl Into<String>) -> Self {
        Self {
            history: NavigationHistory::new(),
            root_label: root_label.into(),
        }
    }

    pub fn history(&self) -> &NavigationHistory {
        &self.history
    }

    pub fn current(&self) -> Option<&NavigationEntry> {
        self.history.current()
    }

    pub fn current_folder_id(&self) -> Option<&str> {
        self.history
            .current()
            .and_then(|entry| entry.folder_id.as_deref())
    }

    /// 当前历史所属的 (provider_id, account_id)。
    pub fn scope(&self) -> Option<(&str, &str)> {
        self.history
            .current()
            .map(|entry| (entry.provider_id.as_str(), entry.account_id.as_str()))
    }

    pub fn can_go_back(&self) -> bool {
        self.history.can_go_back()
    }

    pub fn can_go_forward(&self) -> bool {
        self.history.can_go_forward()
    }

    /// 进入一个文件夹。
    /// - 与当前文件夹相同：不追加重复记录。
    /// - 与“前进”方向的下一条相同：等价于 `go_forward`，保留前进历史。
    /// - 其它情况：截断当前位置之后的历史，再追加新记录。
    /// - 作用域（provider/account）不同：先清空整段历史。
    pub fn navigate_to_folder(
        &mut self,
        folder_id: Option<String>,
        folder_name: String,
        provider_id: &str,
        account_id: &str,
    ) -> NavigationEntry {
        let scope_changed = self
            .history
            .current()
            .is_some_and(|current| !current.in_scope(provider_id, account_id));
        if scope_changed {
            log::warn!(
                "[navigation] scope switched to {provider_id}/{account_id} without clearing history; resetting"
            );
            self.history.clear();
        }

        if let Some(current) = self.history.current() {
            if current.folder_id == folder_id {
                log::debug!("[navigation] ignoring duplicate navigation to {folder_id:?}");
                return current.clone();
            }
        }

        let next_index = self.history.current_index().map_or(0, |index| index + 1);
        let matches_forward = self
            .history
            .get(next_index)
            .is_some_and(|next| next.folder_id == folder_id);
        if matches_forward {
            if let Some(entry) = self.history.set_index(next_index) {
                return entry.clone();
            }
        }

        let path_components = match folder_id {
            None => Vec::new(),
            Some(_) => {
                let mut segments = self
                    .history
                    .current()
                    .map(|current| current.path_components.clone())
                    .unwrap_or_default();
                segments.push(PathSegment {
                    label: folder_name.clone(),
                    folder_id: folder_id.clone(),
                    history_index: next_index,
                });
                segments
            }
        };

        let entry = NavigationEntry {
            folder_id,
            folder_name,
            provider_id: provider_id.to_string(),
            account_id: account_id.to_string(),
            path_components,
        };
        self.history.push(entry.clone());
        entry
    }

    /// 丢弃全部历史，只保留一条根目录记录。
    pub fn go_home(&mut self, provider_id: &str, account_id: &str) -> NavigationEntry {
        let root = NavigationEntry::root(provider_id, account_id, &self.root_label);
        self.history.reset_with(root.clone());
        root
    }

    pub fn go_back(&mut self) -> Option<NavigationEntry> {
        if !self.history.can_go_back() {
            return None;
        }
        let index = self.history.current_index()? - 1;
        self.history.set_index(index).cloned()
    }

    pub fn go_forward(&mut self) -> Option<NavigationEntry> {
        if !self.history.can_go_forward() {
            return None;
        }
        let index = self.history.current_index()? + 1;
        self.history.set_index(index).cloned()
    }

    /// 直接跳到指定历史位置；不截断后续记录。
    pub fn navigate_to_index(&mut self, index: usize) -> Option<NavigationEntry> {
        self.history.set_index(index).cloned()
    }

    /// 切换 provider 或账号时调用：folder_id 只在同一作用域内有意义。
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn breadcrumbs(&self, home_label: &str) -> Vec<BreadcrumbItem> {
        build_breadcrumbs(&self.history, home_label)
    }

    /// 处理面包屑点击。当前位置不可点击，返回 `None`。
    pub fn navigate_to_breadcrumb(&mut self, item: &BreadcrumbItem) -> Option<NavigationEntry> {
        if item.is_current {
            return None;
        }
        match item.history_index {
            Some(index) => self.navigate_to_index(index),
            None if item.is_home => {
                let (provider_id, account_id) = self
                    .scope()
                    .map(|(p, a)| (p.to_string(), a.to_string()))?;
                Some(self.go_home(&provider_id, &account_id))
            }
            None => None,
        }
    }
}
