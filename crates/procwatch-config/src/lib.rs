//! procwatch configuration
//!
//! Layered loading of the service configuration: built-in defaults, an
//! optional TOML file, then `PROCWATCH__SECTION__KEY` environment variables.

pub mod error;
pub mod manager;
pub mod types;

pub use error::{ConfigError, Result};
pub use manager::ConfigManager;
pub use types::{
    ExecutionConfig, LoggingConfig, MonitoringConfig, ServerConfig, ServiceConfig, SlaDefaults,
    ThresholdDefaults,
};
