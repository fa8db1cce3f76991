use env_logger::{Builder, Env};

/// 初始化日志输出；宿主可多次调用，只有第一次生效。
/// 默认级别为 info，可通过 `RUST_LOG` 覆盖。
pub fn init_logging() {
    let env = Env::default().filter_or("RUST_LOG", "info");
    if Builder::from_env(env)
        .format_timestamp_millis()
        .try_init()
        .is_err()
    {
        log::debug!("[logging] logger already initialised");
    }
}
