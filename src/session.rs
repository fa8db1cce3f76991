use crate::api::models::{DriveItemSummary, DrivePage};
use crate::navigation::{BreadcrumbItem, NavigationEntry, NavigationManager};
use std::sync::Arc;

/// 外部 provider 的目录列举接口；folder_id 为空表示根目录。
pub trait FolderLister: Send + Sync {
    fn list_folder(
        &self,
        folder_id: Option<&str>,
        provider_id: &str,
        account_id: &str,
    ) -> Result<DrivePage, String>;
}

/// 把目录列举与导航历史串起来：先拉取目标目录，成功后才修改历史，
/// 这样列举失败时界面仍停留在原位置。
pub struct DriveBrowser {
    lister: Arc<dyn FolderLister>,
    navigation: NavigationManager,
    listing: DrivePage,
}

impl DriveBrowser {
    pub fn new(lister: Arc<dyn FolderLister>) -> Self {
        Self::with_navigation(lister, NavigationManager::new())
    }

    pub fn with_navigation(lister: Arc<dyn FolderLister>, navigation: NavigationManager) -> Self {
        Self {
            lister,
            navigation,
            listing: DrivePage::default(),
        }
    }

    pub fn navigation(&self) -> &NavigationManager {
        &self.navigation
    }

    /// 当前目录的子项。
    pub fn listing(&self) -> &DrivePage {
        &self.listing
    }

    pub fn breadcrumbs(&self, home_label: &str) -> Vec<BreadcrumbItem> {
        self.navigation.breadcrumbs(home_label)
    }

    /// 切换 provider 或账号：旧历史立即作废，随后加载新账号的根目录。
    pub fn select_account(
        &mut self,
        provider_id: &str,
        account_id: &str,
    ) -> Result<NavigationEntry, String> {
        self.navigation.clear_history();
        self.listing = DrivePage::default();
        let page = self.lister.list_folder(None, provider_id, account_id)?;
        self.listing = page;
        Ok(self.navigation.go_home(provider_id, account_id))
    }

    pub fn go_home(&mut self) -> Result<NavigationEntry, String> {
        let (provider_id, account_id) = self.require_scope()?;
        let page = self.lister.list_folder(None, &provider_id, &account_id)?;
        self.listing = page;
        Ok(self.navigation.go_home(&provider_id, &account_id))
    }

    pub fn open_folder(&mut self, item: &DriveItemSummary) -> Result<NavigationEntry, String> {
        if !item.is_folder {
            return Err(format!("{} is not a folder", item.name));
        }
        let (provider_id, account_id) = self.require_scope()?;
        let page = self
            .lister
            .list_folder(Some(&item.id), &provider_id, &account_id)?;
        self.listing = page;
        Ok(self.navigation.navigate_to_folder(
            Some(item.id.clone()),
            item.name.clone(),
            &provider_id,
            &account_id,
        ))
    }

    pub fn go_back(&mut self) -> Result<Option<NavigationEntry>, String> {
        if !self.navigation.can_go_back() {
            return Ok(None);
        }
        match self.navigation.history().current_index() {
            Some(index) => self.jump(index - 1),
            None => Ok(None),
        }
    }

    pub fn go_forward(&mut self) -> Result<Option<NavigationEntry>, String> {
        if !self.navigation.can_go_forward() {
            return Ok(None);
        }
        match self.navigation.history().current_index() {
            Some(index) => self.jump(index + 1),
            None => Ok(None),
        }
    }

    pub fn open_breadcrumb(
        &mut self,
        item: &BreadcrumbItem,
    ) -> Result<Option<NavigationEntry>, String> {
        if item.is_current {
            return Ok(None);
        }
        match item.history_index {
            Some(index) => self.jump(index),
            None if item.is_home => self.go_home().map(Some),
            None => Ok(None),
        }
    }

    /// 重新拉取当前目录。
    pub fn refresh(&mut self) -> Result<(), String> {
        let Some(current) = self.navigation.current() else {
            return Ok(());
        };
        let page = self.lister.list_folder(
            current.folder_id.as_deref(),
            &current.provider_id,
            &current.account_id,
        )?;
        self.listing = page;
        Ok(())
    }

    fn jump(&mut self, index: usize) -> Result<Option<NavigationEntry>, String> {
        let Some(target) = self.navigation.history().get(index).cloned() else {
            return Ok(None);
        };
        let page = self.lister.list_folder(
            target.folder_id.as_deref(),
            &target.provider_id,
            &target.account_id,
        )?;
        self.listing = page;
        Ok(self.navigation.navigate_to_index(index))
    }

    fn require_scope(&self) -> Result<(String, String), String> {
        self.navigation
            .scope()
            .map(|(p, a)| (p.to_string(), a.to_string()))
            .ok_or_else(|| "no account selected".to_string())
    }
}
