//! Configuration manager implementation

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};

use crate::{
    error::{ConfigError, Result},
    types::ServiceConfig,
};

/// Loads and validates [`ServiceConfig`]
pub struct ConfigManager {
    /// Configuration file path
    config_path: PathBuf,
    /// Whether the file was asked for explicitly and must exist
    required: bool,
    /// Environment prefix
    env_prefix: String,
}

impl ConfigManager {
    /// Use the per-user config file if it exists
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
            required: false,
            env_prefix: "PROCWATCH".to_string(),
        }
    }

    /// Use an explicit config file, which must exist
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            required: true,
            env_prefix: "PROCWATCH".to_string(),
        }
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("procwatch")
            .join("config.toml")
    }

    /// Merge defaults, the config file and the environment, then validate
    pub fn load(&self) -> Result<ServiceConfig> {
        if self.required && !self.config_path.exists() {
            return Err(ConfigError::NotFound(self.config_path.display().to_string()));
        }

        let defaults = Self::render_default()?;
        let config = Config::builder()
            .add_source(File::from_str(&defaults, FileFormat::Toml))
            .add_source(
                File::from(self.config_path.clone())
                    .format(FileFormat::Toml)
                    .required(self.required),
            )
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let service: ServiceConfig = config.try_deserialize()?;
        Self::validate(&service)?;

        tracing::debug!(
            path = %self.config_path.display(),
            port = service.server.port,
            "Configuration loaded"
        );
        Ok(service)
    }

    pub fn validate(config: &ServiceConfig) -> Result<()> {
        if config.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port must be greater than 0".to_string(),
            ));
        }
        if config.monitoring.max_performance_samples == 0 {
            return Err(ConfigError::Validation(
                "monitoring.max_performance_samples must be greater than 0".to_string(),
            ));
        }
        if config.monitoring.dashboard_top_n == 0 {
            return Err(ConfigError::Validation(
                "monitoring.dashboard_top_n must be greater than 0".to_string(),
            ));
        }

        let thresholds = &config.monitoring.thresholds;
        let sla = &config.monitoring.sla;
        for (name, value) in [
            ("monitoring.thresholds.max_cpu_usage", thresholds.max_cpu_usage),
            ("monitoring.thresholds.min_success_rate", thresholds.min_success_rate),
            ("monitoring.sla.availability", sla.availability),
            ("monitoring.sla.error_rate", sla.error_rate),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::Validation(format!(
                    "{} must be between 0 and 100, got {}",
                    name, value
                )));
            }
        }
        if thresholds.max_execution_time_ms == 0 || thresholds.max_consecutive_failures == 0 {
            return Err(ConfigError::Validation(
                "monitoring.thresholds limits must be greater than 0".to_string(),
            ));
        }
        if thresholds.max_memory_usage_mb <= 0.0 {
            return Err(ConfigError::Validation(
                "monitoring.thresholds.max_memory_usage_mb must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Default configuration as TOML
    pub fn render_default() -> Result<String> {
        Ok(toml::to_string_pretty(&ServiceConfig::default())?)
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
