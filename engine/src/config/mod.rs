//! Viewer configuration loaded from JSON.

pub mod viewer_config;

pub use viewer_config::{ConfigError, ViewerConfig, WindowConfig};
