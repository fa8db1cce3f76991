use super::history::NavigationHistory;

/// 渲染用的面包屑条目。`history_index` 指向点击后要跳转的历史位置。
#[flutter_rust_bridge::frb]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BreadcrumbItem {
    pub label: String,
    pub folder_id: Option<String>,
    pub history_index: Option<usize>,
    pub is_home: bool,
    pub is_current: bool,
}

impl BreadcrumbItem {
    pub fn is_clickable(&self) -> bool {
        !self.is_current
    }
}

/// 根据当前历史生成面包屑：首项固定为 Home，之后依次为路径各段，最后一项为当前位置。
///
/// Home 项的跳转位置取第一段路径的前一条历史（进入第一层文件夹时所在的根目录记录）；
/// 如果历史从子文件夹开始、没有根记录，则 `history_index` 为空，由调用方回到根目录。
pub fn build_breadcrumbs(history: &NavigationHistory, home_label: &str) -> Vec<BreadcrumbItem> {
    let Some(current) = history.current() else {
        return Vec::new();
    };
    let current_index = history.current_index().unwrap_or_default();

    if current.is_root() {
        return vec![BreadcrumbItem {
            label: home_label.to_string(),
            folder_id: None,
            history_index: Some(current_index),
            is_home: true,
            is_current: true,
        }];
    }

    let home_index = current
        .path_components
        .first()
        .and_then(|first| first.history_index.checked_sub(1))
        .filter(|index| history.get(*index).is_some_and(|entry| entry.is_root()));

    let mut items = Vec::with_capacity(current.path_components.len() + 1);
    items.push(BreadcrumbItem {
        label: home_label.to_string(),
        folder_id: None,
        history_index: home_index,
        is_home: true,
        is_current: false,
    });

    let last = current.path_components.len().saturating_sub(1);
    for (position, segment) in current.path_components.iter().enumerate() {
        let is_current = position == last;
        items.push(BreadcrumbItem {
            label: segment.label.clone(),
            folder_id: segment.folder_id.clone(),
            history_index: Some(if is_current {
                current_index
            } else {
                segment.history_index
            }),
            is_home: false,
            is_current,
        });
    }
    items
}
