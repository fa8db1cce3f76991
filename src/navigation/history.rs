/// 面包屑中的一段路径，记录进入该文件夹时产生的历史下标，
/// 便于点击面包屑时直接定位历史，而不是按名称反查。
#[flutter_rust_bridge::frb]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathSegment {
    pub label: String,
    pub folder_id: Option<String>,
    pub history_index: usize,
}

/// 一次文件夹访问的不可变记录；只会整体追加或替换，不会原地修改。
#[flutter_rust_bridge::frb]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavigationEntry {
    pub folder_id: Option<String>,
    pub folder_name: String,
    pub provider_id: String,
    pub account_id: String,
    pub path_components: Vec<PathSegment>,
}

impl NavigationEntry {
    pub(crate) fn root(provider_id: &str, account_id: &str, folder_name: &str) -> Self {
        Self {
            folder_id: None,
            folder_name: folder_name.to_string(),
            provider_id: provider_id.to_string(),
            account_id: account_id.to_string(),
            path_components: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.folder_id.is_none()
    }

    /// 判断该记录是否属于给定的 provider + account。
    pub fn in_scope(&self, provider_id: &str, account_id: &str) -> bool {
        self.provider_id == provider_id && self.account_id == account_id
    }

    pub fn labels(&self) -> Vec<&str> {
        self.path_components
            .iter()
            .map(|segment| segment.label.as_str())
            .collect()
    }
}

/// 有序访问历史 + 当前位置。
/// 非空时 `current_index` 一定落在 `[0, entries.len())` 内。
#[flutter_rust_bridge::frb(opaque)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NavigationHistory {
    entries: Vec<NavigationEntry>,
    current_index: Option<usize>,
}

impl NavigationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[NavigationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn current(&self) -> Option<&NavigationEntry> {
        self.current_index.and_then(|index| self.entries.get(index))
    }

    pub fn get(&self, index: usize) -> Option<&NavigationEntry> {
        self.entries.get(index)
    }

    pub fn can_go_back(&self) -> bool {
        matches!(self.current_index, Some(index) if index > 0)
    }

    pub fn can_go_forward(&self) -> bool {
        matches!(self.current_index, Some(index) if index + 1 < self.entries.len())
    }

    /// 丢弃当前位置之后的所有记录，再追加新记录并指向它。
    pub(crate) fn push(&mut self, entry: NavigationEntry) {
        if let Some(index) = self.current_index {
            self.entries.truncate(index + 1);
        }
        self.entries.push(entry);
        self.current_index = Some(self.entries.len() - 1);
    }

    pub(crate) fn set_index(&mut self, index: usize) -> Option<&NavigationEntry> {
        if index >= self.entries.len() {
            return None;
        }
        self.current_index = Some(index);
        self.debug_check();
        self.entries.get(index)
    }

    pub(crate) fn reset_with(&mut self, entry: NavigationEntry) {
        self.entries.clear();
        self.entries.push(entry);
        self.current_index = Some(0);
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.current_index = None;
    }

    fn debug_check(&self) {
        debug_assert!(
            match self.current_index {
                Some(index) => index < self.entries.len(),
                None => self.entries.is_empty(),
            },
            "navigation index out of bounds"
        );
    }
}
