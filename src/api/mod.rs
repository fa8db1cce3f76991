pub mod models;
pub mod navigation;
pub mod session;
pub mod settings;
pub mod upload;
