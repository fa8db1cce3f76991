pub mod breadcrumb;
pub mod history;
pub mod manager;

pub use breadcrumb::{build_breadcrumbs, BreadcrumbItem};
pub use history::{NavigationEntry, NavigationHistory, PathSegment};
pub use manager::NavigationManager;
