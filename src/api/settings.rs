use crate::db::Database;
use crate::settings::{
    get_transfer_throttle as core_get_transfer_throttle,
    get_upload_concurrency as core_get_upload_concurrency,
    set_transfer_throttle as core_set_transfer_throttle,
    set_upload_concurrency as core_set_upload_concurrency, TransferThrottle,
};

/// FRB 对外接口：获取当前并行上传数设置。
#[flutter_rust_bridge::frb]
pub fn get_upload_concurrency() -> Result<u32, String> {
    let db = Database::open_default()?;
    core_get_upload_concurrency(&db).map(|value| value as u32)
}

/// FRB 对外接口：更新并行上传数，对之后新建的会话生效。
#[flutter_rust_bridge::frb]
pub fn set_upload_concurrency(limit: u32) -> Result<u32, String> {
    let db = Database::open_default()?;
    core_set_upload_concurrency(&db, limit as usize).map(|value| value as u32)
}

#[flutter_rust_bridge::frb]
pub fn get_transfer_throttle() -> Result<TransferThrottle, String> {
    let db = Database::open_default()?;
    core_get_transfer_throttle(&db)
}

/// FRB 对外接口：开关调试用的慢速分片上传。
#[flutter_rust_bridge::frb]
pub fn set_transfer_throttle(throttle: TransferThrottle) -> Result<TransferThrottle, String> {
    let db = Database::open_default()?;
    core_set_transfer_throttle(&db, throttle)
}
