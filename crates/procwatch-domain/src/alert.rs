//! Alerts raised against a process monitor
//!
//! Lifecycle: `Triggered -> Acknowledged (optional) -> Resolved`. Alerts are
//! never deleted; a resolved alert stays in the monitor's history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, DomainResult};
use crate::value_objects::{Actor, AlertId, MonitorId};

/// Alert category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertType {
    #[serde(rename = "Execution_Timeout")]
    ExecutionTimeout,
    #[serde(rename = "Memory_Threshold")]
    MemoryThreshold,
    #[serde(rename = "CPU_Threshold")]
    CpuThreshold,
    #[serde(rename = "High_Error_Rate")]
    HighErrorRate,
    #[serde(rename = "Consecutive_Failures")]
    ConsecutiveFailures,
    #[serde(rename = "SLA_Breach")]
    SlaBreach,
    #[serde(rename = "Manual")]
    Manual,
}

/// Severity levels, ordered from least to most urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertState {
    Triggered,
    Acknowledged,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub alert_id: AlertId,
    pub monitor_id: MonitorId,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub status: AlertState,
    pub triggered_at: DateTime<Utc>,
    pub last_triggered_at: DateTime<Utc>,
    /// How many breaches were folded into this alert
    pub occurrences: u32,
    pub acknowledged_by: Option<String>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub revision: u64,
}

impl Alert {
    pub fn new(
        monitor_id: MonitorId,
        alert_type: AlertType,
        severity: Severity,
        message: impl Into<String>,
        metadata: serde_json::Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            alert_id: AlertId::new(),
            monitor_id,
            alert_type,
            severity,
            message: message.into(),
            metadata,
            status: AlertState::Triggered,
            triggered_at: now,
            last_triggered_at: now,
            occurrences: 1,
            acknowledged_by: None,
            acknowledged_at: None,
            resolved_by: None,
            resolved_at: None,
            revision: 0,
        }
    }

    /// Unresolved alerts count as active
    pub fn is_open(&self) -> bool {
        self.status != AlertState::Resolved
    }

    /// Fold a repeated breach of the same type into this open alert
    pub fn recur(&mut self, message: impl Into<String>, metadata: serde_json::Value) {
        self.occurrences += 1;
        self.last_triggered_at = Utc::now();
        self.message = message.into();
        self.metadata = metadata;
    }

    /// Acknowledge an open alert; a repeated acknowledgement keeps the first one
    pub fn acknowledge(&mut self, actor: &Actor) -> DomainResult<()> {
        match self.status {
            AlertState::Resolved => Err(DomainError::invalid_state(format!(
                "Alert {} is already resolved",
                self.alert_id
            ))),
            AlertState::Acknowledged => Ok(()),
            AlertState::Triggered => {
                self.status = AlertState::Acknowledged;
                self.acknowledged_by = Some(actor.id.clone());
                self.acknowledged_at = Some(Utc::now());
                Ok(())
            }
        }
    }

    pub fn resolve(&mut self, actor: &Actor) -> DomainResult<()> {
        if self.status == AlertState::Resolved {
            return Err(DomainError::invalid_state(format!(
                "Alert {} is already resolved",
                self.alert_id
            )));
        }
        self.status = AlertState::Resolved;
        self.resolved_by = Some(actor.id.clone());
        self.resolved_at = Some(Utc::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert() -> Alert {
        Alert::new(
            MonitorId::new(),
            AlertType::CpuThreshold,
            Severity::Medium,
            "CPU usage 91% exceeds 80%",
            serde_json::json!({"cpuUsage": 91.0}),
        )
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_value(AlertType::CpuThreshold).unwrap(),
            serde_json::json!("CPU_Threshold")
        );
        assert_eq!(
            serde_json::to_value(AlertType::ExecutionTimeout).unwrap(),
            serde_json::json!("Execution_Timeout")
        );
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn test_acknowledge_then_resolve() {
        let mut alert = alert();
        alert.acknowledge(&Actor::new("u1", None)).unwrap();
        assert_eq!(alert.status, AlertState::Acknowledged);
        assert!(alert.is_open());

        alert.resolve(&Actor::new("u2", None)).unwrap();
        assert_eq!(alert.status, AlertState::Resolved);
        assert_eq!(alert.acknowledged_by.as_deref(), Some("u1"));
        assert_eq!(alert.resolved_by.as_deref(), Some("u2"));
    }

    #[test]
    fn test_resolve_twice_fails() {
        let mut alert = alert();
        alert.resolve(&Actor::system()).unwrap();
        assert!(alert.resolve(&Actor::system()).is_err());
        assert!(alert.acknowledge(&Actor::system()).is_err());
    }

    #[test]
    fn test_recur_counts_occurrences() {
        let mut alert = alert();
        alert.recur("CPU usage 95% exceeds 80%", serde_json::json!({"cpuUsage": 95.0}));
        assert_eq!(alert.occurrences, 2);
        assert_eq!(alert.metadata["cpuUsage"], 95.0);
    }
}
