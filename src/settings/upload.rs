use crate::db::Database;
use crate::upload_manager::chunker::{
    Chunker, FixedSizeChunker, WholeBufferChunker, DEFAULT_CHUNK_SIZE,
};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

const CONCURRENCY_KEY: &str = "upload_max_concurrency";
const THROTTLE_KEY: &str = "upload_throttle";

pub const MIN_UPLOAD_CONCURRENCY: usize = 1;
pub const MAX_UPLOAD_CONCURRENCY: usize = 8;
const CONCURRENCY_RANGE: RangeInclusive<usize> = MIN_UPLOAD_CONCURRENCY..=MAX_UPLOAD_CONCURRENCY;
const DEFAULT_UPLOAD_CONCURRENCY: usize = 2;
const DEFAULT_DELAY_MILLIS: u64 = 50;

/// 调试用的慢速上传配置：开启后按 `chunk_size` 切片，每片之间等待 `delay_millis`。
#[flutter_rust_bridge::frb]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransferThrottle {
    pub enabled: bool,
    pub chunk_size: usize,
    pub delay_millis: u64,
}

impl Default for TransferThrottle {
    fn default() -> Self {
        Self {
            enabled: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
            delay_millis: DEFAULT_DELAY_MILLIS,
        }
    }
}

impl TransferThrottle {
    /// 根据配置选择分片策略；关闭时整块上传。
    #[flutter_rust_bridge::frb(ignore)]
    pub fn chunker(&self) -> Arc<dyn Chunker> {
        if self.enabled {
            Arc::new(FixedSizeChunker::new(
                self.chunk_size,
                Duration::from_millis(self.delay_millis),
            ))
        } else {
            Arc::new(WholeBufferChunker)
        }
    }
}

/// 新建会话时一次性读取的上传配置。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadSettings {
    pub max_concurrency: usize,
    pub throttle: TransferThrottle,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_UPLOAD_CONCURRENCY,
            throttle: TransferThrottle::default(),
        }
    }
}

/// 读取全部上传配置；单项损坏时该项退回默认值并记录日志，存储本身不可用时返回错误。
pub fn load_upload_settings(db: &Database) -> Result<UploadSettings, String> {
    let concurrency = db.get_setting(CONCURRENCY_KEY)?;
    let throttle = db.get_setting(THROTTLE_KEY)?;
    let defaults = UploadSettings::default();
    Ok(UploadSettings {
        max_concurrency: concurrency
            .map(|raw| parse_concurrency(&raw))
            .transpose()
            .unwrap_or_else(|err| {
                log::warn!("[settings] {err}; using default concurrency");
                None
            })
            .unwrap_or(defaults.max_concurrency),
        throttle: throttle
            .map(|raw| parse_throttle(&raw))
            .transpose()
            .unwrap_or_else(|err| {
                log::warn!("[settings] {err}; upload throttle disabled");
                None
            })
            .unwrap_or(defaults.throttle),
    })
}

/// 并行上传数；缺失时为默认值，存储值超出范围时夹到区间内。
pub fn get_upload_concurrency(db: &Database) -> Result<usize, String> {
    match db.get_setting(CONCURRENCY_KEY)? {
        Some(raw) => parse_concurrency(&raw),
        None => Ok(DEFAULT_UPLOAD_CONCURRENCY),
    }
}

/// 写入前校验区间，越界直接拒绝而不是静默截断。
pub fn set_upload_concurrency(db: &Database, value: usize) -> Result<usize, String> {
    if !CONCURRENCY_RANGE.contains(&value) {
        return Err(format!(
            "upload concurrency must be between {MIN_UPLOAD_CONCURRENCY} and {MAX_UPLOAD_CONCURRENCY}, got {value}"
        ));
    }
    db.set_setting(CONCURRENCY_KEY, &value.to_string())?;
    log::info!("[settings] upload concurrency set to {value}");
    Ok(value)
}

pub fn default_upload_concurrency() -> usize {
    DEFAULT_UPLOAD_CONCURRENCY
}

pub fn get_transfer_throttle(db: &Database) -> Result<TransferThrottle, String> {
    match db.get_setting(THROTTLE_KEY)? {
        Some(raw) => parse_throttle(&raw),
        None => Ok(TransferThrottle::default()),
    }
}

pub fn set_transfer_throttle(
    db: &Database,
    throttle: TransferThrottle,
) -> Result<TransferThrottle, String> {
    if throttle.chunk_size == 0 {
        return Err("chunk size must be greater than zero".to_string());
    }
    let raw = serde_json::to_string(&throttle)
        .map_err(|e| format!("failed to encode upload throttle setting: {e}"))?;
    db.set_setting(THROTTLE_KEY, &raw)?;
    log::info!(
        "[settings] upload throttle {} ({} bytes / {} ms)",
        if throttle.enabled { "enabled" } else { "disabled" },
        throttle.chunk_size,
        throttle.delay_millis
    );
    Ok(throttle)
}

fn parse_concurrency(raw: &str) -> Result<usize, String> {
    raw.trim()
        .parse::<usize>()
        .map(|value| value.clamp(MIN_UPLOAD_CONCURRENCY, MAX_UPLOAD_CONCURRENCY))
        .map_err(|e| format!("invalid upload concurrency value {raw:?}: {e}"))
}

fn parse_throttle(raw: &str) -> Result<TransferThrottle, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid upload throttle setting: {e}"))
}
