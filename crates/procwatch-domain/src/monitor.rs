//! Process monitor aggregate
//!
//! One active monitor per process. Alerts and performance samples are
//! stored as separate child records keyed by the monitor id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alert::Severity;
use crate::errors::{DomainError, DomainResult};
use crate::value_objects::{Actor, MonitorId, ProcessId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
    Down,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self::Healthy
    }
}

/// Alerting thresholds for a monitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    /// Milliseconds
    pub max_execution_time: u64,
    /// Megabytes
    pub max_memory_usage: f64,
    /// Percent
    pub max_cpu_usage: f64,
    /// Percent
    pub min_success_rate: f64,
    pub max_consecutive_failures: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_execution_time: 300_000,
            max_memory_usage: 512.0,
            max_cpu_usage: 80.0,
            min_success_rate: 95.0,
            max_consecutive_failures: 3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdsPatch {
    pub max_execution_time: Option<u64>,
    pub max_memory_usage: Option<f64>,
    pub max_cpu_usage: Option<f64>,
    pub min_success_rate: Option<f64>,
    pub max_consecutive_failures: Option<u32>,
}

impl Thresholds {
    /// Overlay the fields present in `patch`
    pub fn merged(&self, patch: &ThresholdsPatch) -> DomainResult<Self> {
        let merged = Self {
            max_execution_time: patch.max_execution_time.unwrap_or(self.max_execution_time),
            max_memory_usage: patch.max_memory_usage.unwrap_or(self.max_memory_usage),
            max_cpu_usage: patch.max_cpu_usage.unwrap_or(self.max_cpu_usage),
            min_success_rate: patch.min_success_rate.unwrap_or(self.min_success_rate),
            max_consecutive_failures: patch
                .max_consecutive_failures
                .unwrap_or(self.max_consecutive_failures),
        };
        merged.validate()?;
        Ok(merged)
    }

    pub fn validate(&self) -> DomainResult<()> {
        check_percent("thresholds.maxCpuUsage", self.max_cpu_usage)?;
        check_percent("thresholds.minSuccessRate", self.min_success_rate)?;
        if !(self.max_memory_usage.is_finite() && self.max_memory_usage > 0.0) {
            return Err(DomainError::validation(
                "thresholds.maxMemoryUsage",
                "must be a positive number",
            ));
        }
        if self.max_execution_time == 0 {
            return Err(DomainError::validation(
                "thresholds.maxExecutionTime",
                "must be greater than 0",
            ));
        }
        if self.max_consecutive_failures == 0 {
            return Err(DomainError::validation(
                "thresholds.maxConsecutiveFailures",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

fn check_percent(field: &str, value: f64) -> DomainResult<()> {
    if !(0.0..=100.0).contains(&value) {
        return Err(DomainError::validation(field, "must be between 0 and 100"));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelType {
    Email,
    Slack,
    Webhook,
    Sms,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertChannel {
    pub channel_type: ChannelType,
    pub target: String,
    #[serde(default = "enabled")]
    pub enabled: bool,
}

fn enabled() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationRule {
    /// Escalate when an alert stays unacknowledged this long
    pub after_minutes: u32,
    pub severity: Severity,
    #[serde(default)]
    pub notify: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertSettings {
    #[serde(default)]
    pub channels: Vec<AlertChannel>,
    #[serde(default)]
    pub escalation_rules: Vec<EscalationRule>,
    /// Severities that are pushed to the channels
    #[serde(default = "default_notify_on")]
    pub notify_on_severity: Vec<Severity>,
}

fn default_notify_on() -> Vec<Severity> {
    vec![Severity::Critical, Severity::High]
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            escalation_rules: Vec::new(),
            notify_on_severity: default_notify_on(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentMetrics {
    pub status: HealthStatus,
    pub last_execution_time: Option<u64>,
    pub memory_usage: Option<f64>,
    pub cpu_usage: Option<f64>,
    pub success_rate: Option<f64>,
    pub consecutive_failures: u32,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Declared performance goals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaTargets {
    /// Percent of samples not `Down`
    pub availability: f64,
    /// Mean execution time in milliseconds
    pub response_time: f64,
    /// Successful runs per hour
    pub throughput: f64,
    /// Percent of failed runs
    pub error_rate: f64,
}

impl Default for SlaTargets {
    fn default() -> Self {
        Self {
            availability: 99.9,
            response_time: 5_000.0,
            throughput: 10.0,
            error_rate: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaTargetsPatch {
    pub availability: Option<f64>,
    pub response_time: Option<f64>,
    pub throughput: Option<f64>,
    pub error_rate: Option<f64>,
}

impl SlaTargets {
    pub fn merged(&self, patch: &SlaTargetsPatch) -> DomainResult<Self> {
        let merged = Self {
            availability: patch.availability.unwrap_or(self.availability),
            response_time: patch.response_time.unwrap_or(self.response_time),
            throughput: patch.throughput.unwrap_or(self.throughput),
            error_rate: patch.error_rate.unwrap_or(self.error_rate),
        };
        check_percent("slaTargets.availability", merged.availability)?;
        check_percent("slaTargets.errorRate", merged.error_rate)?;
        if merged.response_time < 0.0 || merged.throughput < 0.0 {
            return Err(DomainError::validation(
                "slaTargets",
                "responseTime and throughput must not be negative",
            ));
        }
        Ok(merged)
    }
}

/// Observed SLA figures, recomputed from the performance history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaStatus {
    pub current_availability: Option<f64>,
    pub current_response_time: Option<f64>,
    pub current_throughput: Option<f64>,
    pub current_error_rate: Option<f64>,
    pub compliance_percentage: f64,
    pub is_compliant: bool,
    pub last_calculated: Option<DateTime<Utc>>,
}

/// One metrics sample as reported for a monitored process
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSample {
    /// Milliseconds
    pub execution_time: Option<u64>,
    /// Megabytes
    pub memory_usage: Option<f64>,
    /// Percent
    pub cpu_usage: Option<f64>,
    pub error_count: Option<u64>,
    pub success_count: Option<u64>,
}

impl MetricsSample {
    /// Success rate in percent; defined only when both counts are reported
    pub fn success_rate(&self) -> Option<f64> {
        let success = self.success_count? as f64;
        let total = success + self.error_count? as f64;
        if total == 0.0 {
            return None;
        }
        Some(success / total * 100.0)
    }

    /// A run that reported errors and no successes
    pub fn is_failure(&self) -> bool {
        self.error_count.unwrap_or(0) > 0 && self.success_count.unwrap_or(0) == 0
    }
}

/// Stored performance history entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSample {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub metrics: MetricsSample,
    pub status: HealthStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessMonitor {
    pub id: MonitorId,
    pub process_id: ProcessId,
    pub name: String,
    pub thresholds: Thresholds,
    pub alert_settings: AlertSettings,
    pub current_metrics: CurrentMetrics,
    /// 0 to 100
    pub health_score: f64,
    pub sla_targets: SlaTargets,
    pub sla_status: SlaStatus,
    pub is_active: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub revision: u64,
}

impl ProcessMonitor {
    pub fn new(
        process_id: ProcessId,
        name: impl Into<String>,
        thresholds: Thresholds,
        alert_settings: AlertSettings,
        sla_targets: SlaTargets,
        actor: &Actor,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: MonitorId::new(),
            process_id,
            name: name.into(),
            thresholds,
            alert_settings,
            current_metrics: CurrentMetrics::default(),
            health_score: 100.0,
            sla_targets,
            sla_status: SlaStatus::default(),
            is_active: true,
            created_by: actor.id.clone(),
            created_at: now,
            updated_at: now,
            revision: 0,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
