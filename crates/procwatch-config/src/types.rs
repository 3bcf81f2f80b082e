//! Service configuration types

use serde::{Deserialize, Serialize};

/// Top-level service configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub execution: ExecutionConfig,
    pub monitoring: MonitoringConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Simulated execution settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Delay before a started execution completes
    pub completion_delay_ms: u64,
    /// Attempts at updating process metrics after a run
    pub metrics_retries: usize,
}

/// Monitor store and dashboard settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Fold repeated breaches into the open alert of the same type
    pub coalesce_duplicate_alerts: bool,
    /// Performance samples kept per monitor
    pub max_performance_samples: usize,
    /// Entries in the dashboard's top processes list
    pub dashboard_top_n: usize,
    /// Retries after a lost compare-and-swap
    pub cas_retries: usize,
    /// Thresholds for monitors created without explicit ones
    pub thresholds: ThresholdDefaults,
    /// SLA targets for monitors created without explicit ones
    pub sla: SlaDefaults,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThresholdDefaults {
    pub max_execution_time_ms: u64,
    pub max_memory_usage_mb: f64,
    pub max_cpu_usage: f64,
    pub min_success_rate: f64,
    pub max_consecutive_failures: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SlaDefaults {
    pub availability: f64,
    pub response_time_ms: f64,
    pub throughput_per_hour: f64,
    pub error_rate: f64,
}

/// Log output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directives; `RUST_LOG` wins when set
    pub filter: String,
    /// Emit JSON lines instead of the human-readable format
    pub json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            completion_delay_ms: 5_000,
            metrics_retries: 3,
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            coalesce_duplicate_alerts: true,
            max_performance_samples: 1_000,
            dashboard_top_n: 5,
            cas_retries: 3,
            thresholds: ThresholdDefaults::default(),
            sla: SlaDefaults::default(),
        }
    }
}

impl Default for ThresholdDefaults {
    fn default() -> Self {
        Self {
            max_execution_time_ms: 300_000,
            max_memory_usage_mb: 512.0,
            max_cpu_usage: 80.0,
            min_success_rate: 95.0,
            max_consecutive_failures: 3,
        }
    }
}

impl Default for SlaDefaults {
    fn default() -> Self {
        Self {
            availability: 99.9,
            response_time_ms: 5_000.0,
            throughput_per_hour: 10.0,
            error_rate: 1.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,tower_http=info".to_string(),
            json: false,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
