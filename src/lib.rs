// Library exports for the driver binary and integration tests

pub mod collection;
pub mod config;
pub mod dashboard;
pub mod drag;
pub mod format;
pub mod ids;
pub mod logging;
pub mod models;
pub mod notifications;
pub mod persistence;
pub mod registry;
pub mod upload;

// Re-export the state container at crate root for easier access
pub use dashboard::{Dashboard, DashboardOptions, Surface, UploadServices};
