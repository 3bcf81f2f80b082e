//! Monitoring dashboard rollups
//!
//! Read-only aggregation across active monitors for a time window. Monitors
//! are visited in id order so identical state yields identical output.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use futures::future::try_join_all;
use serde::Serialize;

use procwatch_domain::{
    Alert, AlertRepository, DomainError, DomainResult, HealthStatus, MonitorId,
    MonitorRepository, PerformanceRepository, PerformanceSample, ProcessId, ProcessMonitor,
    Severity,
};

use crate::alerting::round2;
use crate::health::mean;

const TREND_BUCKETS: usize = 12;

/// Dashboard window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Timeframe {
    #[serde(rename = "1h")]
    Hour,
    #[default]
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
}

impl Timeframe {
    pub fn duration(self) -> TimeDelta {
        match self {
            Timeframe::Hour => TimeDelta::hours(1),
            Timeframe::Day => TimeDelta::days(1),
            Timeframe::Week => TimeDelta::days(7),
            Timeframe::Month => TimeDelta::days(30),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::Hour => "1h",
            Timeframe::Day => "24h",
            Timeframe::Week => "7d",
            Timeframe::Month => "30d",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1h" => Ok(Timeframe::Hour),
            "24h" => Ok(Timeframe::Day),
            "7d" => Ok(Timeframe::Week),
            "30d" => Ok(Timeframe::Month),
            other => Err(DomainError::validation(
                "timeframe",
                format!("Unsupported timeframe '{}', expected one of 1h, 24h, 7d, 30d", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceAverages {
    pub execution_time: Option<f64>,
    pub memory_usage: Option<f64>,
    pub cpu_usage: Option<f64>,
    pub health_score: Option<f64>,
    pub samples: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessAlertCount {
    pub monitor_id: MonitorId,
    pub process_id: ProcessId,
    pub name: String,
    pub open_alerts: usize,
    pub status: HealthStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaRollup {
    pub monitors_reporting: usize,
    pub compliant: usize,
    pub average_compliance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendBucket {
    pub start: DateTime<Utc>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub timeframe: Timeframe,
    pub generated_at: DateTime<Utc>,
    pub total_monitors: usize,
    pub monitors_by_status: BTreeMap<HealthStatus, usize>,
    pub open_alerts: usize,
    pub alerts_in_window: usize,
    pub alerts_by_severity: BTreeMap<Severity, usize>,
    pub averages: PerformanceAverages,
    pub top_processes_by_open_alerts: Vec<ProcessAlertCount>,
    pub sla_compliance: SlaRollup,
    pub alert_trend: Vec<TrendBucket>,
}

struct MonitorSnapshot {
    monitor: ProcessMonitor,
    alerts: Vec<Alert>,
    samples: Vec<PerformanceSample>,
}

pub struct MonitoringDashboardAggregator {
    monitors: Arc<dyn MonitorRepository>,
    alerts: Arc<dyn AlertRepository>,
    performance: Arc<dyn PerformanceRepository>,
    top_n: usize,
}

impl MonitoringDashboardAggregator {
    pub fn new(
        monitors: Arc<dyn MonitorRepository>,
        alerts: Arc<dyn AlertRepository>,
        performance: Arc<dyn PerformanceRepository>,
        top_n: usize,
    ) -> Self {
        Self {
            monitors,
            alerts,
            performance,
            top_n,
        }
    }

    pub async fn summarize(&self, timeframe: Timeframe, now: DateTime<Utc>) -> DomainResult<DashboardSummary> {
        let window_start = now - timeframe.duration();
        let snapshots = self.snapshot().await?;

        let mut monitors_by_status: BTreeMap<HealthStatus, usize> = [
            HealthStatus::Healthy,
            HealthStatus::Warning,
            HealthStatus::Critical,
            HealthStatus::Down,
        ]
        .into_iter()
        .map(|s| (s, 0))
        .collect();
        let mut alerts_by_severity: BTreeMap<Severity, usize> = [
            Severity::Low,
            Severity::Medium,
            Severity::High,
            Severity::Critical,
        ]
        .into_iter()
        .map(|s| (s, 0))
        .collect();

        let in_window = |at: DateTime<Utc>| at > window_start && at <= now;

        let mut open_alerts = 0;
        let mut alerts_in_window = 0;
        let mut exec_times = Vec::new();
        let mut memory = Vec::new();
        let mut cpu = Vec::new();
        let mut sample_count = 0;
        let mut per_process = Vec::with_capacity(snapshots.len());
        let mut trend = vec![0usize; TREND_BUCKETS];
        let bucket_ms = (timeframe.duration().num_milliseconds() / TREND_BUCKETS as i64).max(1);

        for snap in &snapshots {
            *monitors_by_status
                .entry(snap.monitor.current_metrics.status)
                .or_default() += 1;

            let open = snap.alerts.iter().filter(|a| a.is_open()).count();
            open_alerts += open;
            per_process.push(ProcessAlertCount {
                monitor_id: snap.monitor.id,
                process_id: snap.monitor.process_id,
                name: snap.monitor.name.clone(),
                open_alerts: open,
                status: snap.monitor.current_metrics.status,
            });

            for alert in snap.alerts.iter().filter(|a| in_window(a.triggered_at)) {
                alerts_in_window += 1;
                *alerts_by_severity.entry(alert.severity).or_default() += 1;

                let offset = (alert.triggered_at - window_start).num_milliseconds();
                let bucket = ((offset - 1).max(0) / bucket_ms) as usize;
                trend[bucket.min(TREND_BUCKETS - 1)] += 1;
            }

            for sample in snap.samples.iter().filter(|s| in_window(s.timestamp)) {
                sample_count += 1;
                if let Some(t) = sample.metrics.execution_time {
                    exec_times.push(t as f64);
                }
                if let Some(m) = sample.metrics.memory_usage {
                    memory.push(m);
                }
                if let Some(c) = sample.metrics.cpu_usage {
                    cpu.push(c);
                }
            }
        }

        let scores: Vec<f64> = snapshots.iter().map(|s| s.monitor.health_score).collect();
        let averages = PerformanceAverages {
            execution_time: mean(&exec_times).map(round2),
            memory_usage: mean(&memory).map(round2),
            cpu_usage: mean(&cpu).map(round2),
            health_score: mean(&scores).map(round2),
            samples: sample_count,
        };

        // stable sort keeps id order among ties
        per_process.sort_by(|a, b| b.open_alerts.cmp(&a.open_alerts));
        per_process.truncate(self.top_n);

        let reporting: Vec<_> = snapshots
            .iter()
            .filter(|s| s.monitor.sla_status.last_calculated.is_some())
            .map(|s| &s.monitor.sla_status)
            .collect();
        let compliance: Vec<f64> = reporting.iter().map(|s| s.compliance_percentage).collect();
        let sla_compliance = SlaRollup {
            monitors_reporting: reporting.len(),
            compliant: reporting.iter().filter(|s| s.is_compliant).count(),
            average_compliance: mean(&compliance).map(round2),
        };

        let alert_trend = trend
            .into_iter()
            .enumerate()
            .map(|(i, count)| TrendBucket {
                start: window_start + TimeDelta::milliseconds(bucket_ms * i as i64),
                count,
            })
            .collect();

        Ok(DashboardSummary {
            timeframe,
            generated_at: now,
            total_monitors: snapshots.len(),
            monitors_by_status,
            open_alerts,
            alerts_in_window,
            alerts_by_severity,
            averages,
            top_processes_by_open_alerts: per_process,
            sla_compliance,
            alert_trend,
        })
    }

    async fn snapshot(&self) -> DomainResult<Vec<MonitorSnapshot>> {
        let mut monitors: Vec<_> = self
            .monitors
            .find_all()
            .await?
            .into_iter()
            .filter(|m| m.is_active)
            .collect();
        monitors.sort_by_key(|m| m.id);

        try_join_all(monitors.into_iter().map(|monitor| async move {
            let alerts = self.alerts.find_by_monitor(&monitor.id).await?;
            let samples = self.performance.find_by_monitor(&monitor.id).await?;
            Ok::<_, DomainError>(MonitorSnapshot {
                monitor,
                alerts,
                samples,
            })
        }))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeframe_parsing() {
        assert_eq!("1h".parse::<Timeframe>().unwrap(), Timeframe::Hour);
        assert_eq!("30d".parse::<Timeframe>().unwrap(), Timeframe::Month);
        assert_eq!(Timeframe::default(), Timeframe::Day);

        let err = "2w".parse::<Timeframe>().unwrap_err();
        assert!(matches!(err, DomainError::ValidationError { .. }));
    }

    #[test]
    fn test_timeframe_serializes_as_label() {
        assert_eq!(serde_json::to_value(Timeframe::Week).unwrap(), "7d");
    }
}
