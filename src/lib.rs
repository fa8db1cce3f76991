pub mod accounts;
pub mod api;
pub mod db;
pub mod logging;
pub mod navigation;
pub mod session;
pub mod settings;
pub mod upload_manager;
