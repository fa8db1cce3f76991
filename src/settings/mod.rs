pub mod upload;

pub use upload::{
    default_upload_concurrency, get_transfer_throttle, get_upload_concurrency,
    load_upload_settings, set_transfer_throttle, set_upload_concurrency, TransferThrottle,
    UploadSettings, MAX_UPLOAD_CONCURRENCY, MIN_UPLOAD_CONCURRENCY,
};
