/// 账号资料，替代 UI 层原先使用的动态字典。
#[flutter_rust_bridge::frb]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountProfile {
    pub id: String,
    pub provider_id: String,
    pub name: String,
    pub email: Option<String>,
    pub picture_url: Option<String>,
    pub needs_reauth: bool,
}

/// 已登录账号的内存目录，按 (provider_id, id) 唯一。
#[flutter_rust_bridge::frb(opaque)]
#[derive(Clone, Debug, Default)]
pub struct AccountDirectory {
    accounts: Vec<AccountProfile>,
}

impl AccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新增或整体替换同一账号的资料。
    pub fn upsert(&mut self, profile: AccountProfile) {
        match self
            .accounts
            .iter_mut()
            .find(|a| a.provider_id == profile.provider_id && a.id == profile.id)
        {
            Some(existing) => *existing = profile,
            None => self.accounts.push(profile),
        }
    }

    pub fn get(&self, provider_id: &str, account_id: &str) -> Option<&AccountProfile> {
        self.accounts
            .iter()
            .find(|a| a.provider_id == provider_id && a.id == account_id)
    }

    pub fn accounts_for(&self, provider_id: &str) -> Vec<AccountProfile> {
        self.accounts
            .iter()
            .filter(|a| a.provider_id == provider_id)
            .cloned()
            .collect()
    }

    /// 令牌无法刷新时调用，UI 据此提示重新登录。
    pub fn mark_needs_reauth(&mut self, provider_id: &str, account_id: &str) -> bool {
        self.set_needs_reauth(provider_id, account_id, true)
    }

    /// 重新登录成功后清除标记。
    pub fn clear_needs_reauth(&mut self, provider_id: &str, account_id: &str) -> bool {
        self.set_needs_reauth(provider_id, account_id, false)
    }

    fn set_needs_reauth(&mut self, provider_id: &str, account_id: &str, value: bool) -> bool {
        match self
            .accounts
            .iter_mut()
            .find(|a| a.provider_id == provider_id && a.id == account_id)
        {
            Some(account) => {
                account.needs_reauth = value;
                true
            }
            None => {
                log::debug!("[accounts] unknown account {provider_id}/{account_id}");
                false
            }
        }
    }

    pub fn remove(&mut self, provider_id: &str, account_id: &str) -> Option<AccountProfile> {
        let pos = self
            .accounts
            .iter()
            .position(|a| a.provider_id == provider_id && a.id == account_id)?;
        Some(self.accounts.remove(pos))
    }
}
