//! Process monitor store
//!
//! Owns the monitor lifecycle: creation (one active monitor per process),
//! performance ingestion, alert raising and the acknowledge/resolve flow.
//! Every mutation is a read-modify-write guarded by the record's revision
//! and retried a bounded number of times when it loses a race.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use procwatch_domain::{
    Actor, Alert, AlertId, AlertRepository, AlertSettings, AlertType, DomainError, DomainResult,
    HealthStatus, MetricsSample, MonitorId, MonitorRepository, PerformanceRepository,
    PerformanceSample, ProcessId, ProcessMonitor, ProcessRepository, Severity, SlaTargets,
    SlaTargetsPatch, Thresholds, ThresholdsPatch,
};

use crate::alerting::{AlertEvaluator, AlertIntent};
use crate::health::{compute_sla_status, health_score, status_for_score};
use crate::notification::{should_notify, AlertNotifier, TracingNotifier};

/// Tunables for the monitor store
#[derive(Debug, Clone)]
pub struct MonitorStoreOptions {
    /// Fold repeated breaches into the open alert of the same type
    pub coalesce_duplicate_alerts: bool,
    pub max_performance_samples: usize,
    pub default_thresholds: Thresholds,
    pub default_sla_targets: SlaTargets,
    /// Extra attempts after a lost compare-and-swap
    pub cas_retries: usize,
}

impl Default for MonitorStoreOptions {
    fn default() -> Self {
        Self {
            coalesce_duplicate_alerts: true,
            max_performance_samples: 1_000,
            default_thresholds: Thresholds::default(),
            default_sla_targets: SlaTargets::default(),
            cas_retries: 3,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMonitor {
    pub process_id: ProcessId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub thresholds: Option<ThresholdsPatch>,
    #[serde(default)]
    pub alert_settings: Option<AlertSettings>,
    #[serde(default)]
    pub sla_targets: Option<SlaTargetsPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorPatch {
    pub name: Option<String>,
    pub thresholds: Option<ThresholdsPatch>,
    pub alert_settings: Option<AlertSettings>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorFilter {
    pub status: Option<HealthStatus>,
    pub process_id: Option<ProcessId>,
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertHistoryFilter {
    pub severity: Option<Severity>,
    pub alert_type: Option<AlertType>,
    pub resolved: Option<bool>,
    pub limit: Option<usize>,
}

/// A manually raised alert
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualAlert {
    #[serde(default = "manual")]
    pub alert_type: AlertType,
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

fn manual() -> AlertType {
    AlertType::Manual
}

/// Monitor together with its open alerts
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorView {
    #[serde(flatten)]
    pub monitor: ProcessMonitor,
    pub active_alerts: Vec<Alert>,
}

/// Result of ingesting one performance sample
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceOutcome {
    pub monitor: ProcessMonitor,
    /// Alerts opened or re-triggered by this sample
    pub alerts: Vec<Alert>,
}

pub struct ProcessMonitorStore {
    processes: Arc<dyn ProcessRepository>,
    monitors: Arc<dyn MonitorRepository>,
    alerts: Arc<dyn AlertRepository>,
    performance: Arc<dyn PerformanceRepository>,
    notifier: Arc<dyn AlertNotifier>,
    options: MonitorStoreOptions,
}

impl ProcessMonitorStore {
    pub fn new(
        processes: Arc<dyn ProcessRepository>,
        monitors: Arc<dyn MonitorRepository>,
        alerts: Arc<dyn AlertRepository>,
        performance: Arc<dyn PerformanceRepository>,
        options: MonitorStoreOptions,
    ) -> Self {
        Self {
            processes,
            monitors,
            alerts,
            performance,
            notifier: Arc::new(TracingNotifier),
            options,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn AlertNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn options(&self) -> &MonitorStoreOptions {
        &self.options
    }

    /// Attach a monitor to a process
    ///
    /// # Errors
    /// `EntityNotFound` when the process is missing or deleted, `Conflict`
    /// when the process already has an active monitor.
    pub async fn create_monitor(&self, input: CreateMonitor, actor: &Actor) -> DomainResult<ProcessMonitor> {
        let process = self
            .processes
            .find_by_id(&input.process_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| DomainError::not_found("AutomatedProcess", input.process_id))?;

        let thresholds = match &input.thresholds {
            Some(patch) => self.options.default_thresholds.merged(patch)?,
            None => self.options.default_thresholds.clone(),
        };
        let sla_targets = match &input.sla_targets {
            Some(patch) => self.options.default_sla_targets.merged(patch)?,
            None => self.options.default_sla_targets.clone(),
        };
        let name = input
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("{} Monitor", process.name));

        let monitor = ProcessMonitor::new(
            process.id,
            name,
            thresholds,
            input.alert_settings.unwrap_or_default(),
            sla_targets,
            actor,
        );
        self.monitors.insert_unique(&monitor).await?;

        tracing::info!(
            monitor_id = %monitor.id,
            process_id = %process.id,
            "Monitor created"
        );
        Ok(monitor)
    }

    pub async fn get_monitor(&self, id: &MonitorId) -> DomainResult<ProcessMonitor> {
        self.load_monitor(id, false).await
    }

    pub async fn view(&self, id: &MonitorId) -> DomainResult<MonitorView> {
        let monitor = self.load_monitor(id, false).await?;
        let active_alerts = self.active_alerts(id).await?;
        Ok(MonitorView {
            monitor,
            active_alerts,
        })
    }

    /// The active monitor watching a process, if any
    pub async fn active_monitor_for(&self, process_id: &ProcessId) -> DomainResult<Option<ProcessMonitor>> {
        self.monitors.find_active_by_process(process_id).await
    }

    pub async fn list_monitors(&self, filter: &MonitorFilter) -> DomainResult<Vec<ProcessMonitor>> {
        Ok(self
            .monitors
            .find_all()
            .await?
            .into_iter()
            .filter(|m| filter.include_inactive || m.is_active)
            .filter(|m| filter.status.map_or(true, |s| m.current_metrics.status == s))
            .filter(|m| filter.process_id.map_or(true, |p| m.process_id == p))
            .collect())
    }

    pub async fn update_monitor(&self, id: &MonitorId, patch: MonitorPatch) -> DomainResult<ProcessMonitor> {
        let updated = self
            .modify_monitor(id, |monitor| {
                if let Some(name) = &patch.name {
                    let name = name.trim();
                    if name.is_empty() {
                        return Err(DomainError::validation("name", "Monitor name cannot be empty"));
                    }
                    monitor.name = name.to_string();
                }
                if let Some(thresholds) = &patch.thresholds {
                    monitor.thresholds = monitor.thresholds.merged(thresholds)?;
                }
                if let Some(settings) = &patch.alert_settings {
                    monitor.alert_settings = settings.clone();
                }
                Ok(())
            })
            .await?;

        tracing::info!(monitor_id = %id, "Monitor updated");
        Ok(updated)
    }

    /// Deactivate the monitor; the record and its alert history stay queryable
    pub async fn soft_delete(&self, id: &MonitorId) -> DomainResult<ProcessMonitor> {
        let deleted = self
            .modify_monitor(id, |monitor| {
                monitor.is_active = false;
                Ok(())
            })
            .await?;

        tracing::info!(monitor_id = %id, "Monitor deactivated");
        Ok(deleted)
    }

    /// Ingest a metrics sample
    ///
    /// Appends to the performance history, refreshes current metrics, health
    /// score and SLA status, then raises alerts for breached thresholds.
    pub async fn add_performance_data(
        &self,
        id: &MonitorId,
        sample: MetricsSample,
        status: Option<HealthStatus>,
    ) -> DomainResult<PerformanceOutcome> {
        let mut attempt = 0;
        let (monitor, intents) = loop {
            let mut monitor = self.load_monitor(id, false).await?;

            let previous = monitor.current_metrics.consecutive_failures;
            let consecutive_failures = if sample.is_failure() {
                previous + 1
            } else if sample.success_count.unwrap_or(0) > 0 {
                0
            } else {
                previous
            };

            let intents = AlertEvaluator::evaluate_with_failures(
                &sample,
                &monitor.thresholds,
                consecutive_failures,
            );
            let score = health_score(&sample, &monitor.thresholds, consecutive_failures);
            let status = status.unwrap_or_else(|| status_for_score(score));
            let now = Utc::now();

            let metrics = &mut monitor.current_metrics;
            metrics.status = status;
            metrics.consecutive_failures = consecutive_failures;
            metrics.last_updated = Some(now);
            if sample.execution_time.is_some() {
                metrics.last_execution_time = sample.execution_time;
            }
            if sample.memory_usage.is_some() {
                metrics.memory_usage = sample.memory_usage;
            }
            if sample.cpu_usage.is_some() {
                metrics.cpu_usage = sample.cpu_usage;
            }
            if let Some(rate) = sample.success_rate() {
                metrics.success_rate = Some(rate);
            }
            monitor.health_score = score;

            let mut history = self.performance.find_by_monitor(id).await?;
            let entry = PerformanceSample {
                timestamp: now,
                metrics: sample.clone(),
                status,
            };
            history.push(entry.clone());
            let overflow = history.len().saturating_sub(self.options.max_performance_samples);
            monitor.sla_status = compute_sla_status(&history[overflow..], &monitor.sla_targets, now);
            monitor.touch();

            match self.monitors.update_if_revision(&monitor).await {
                Ok(saved) => {
                    self.performance
                        .append(id, entry, self.options.max_performance_samples)
                        .await?;
                    break (saved, intents);
                }
                Err(err) if err.is_retryable() && attempt < self.options.cas_retries => {
                    attempt += 1;
                    tracing::debug!(monitor_id = %id, attempt, "Retrying performance update");
                }
                Err(err) => return Err(err),
            }
        };

        let mut raised = Vec::with_capacity(intents.len());
        for intent in intents {
            raised.push(self.raise(&monitor, intent, self.options.coalesce_duplicate_alerts).await?);
        }

        tracing::debug!(
            monitor_id = %id,
            status = ?monitor.current_metrics.status,
            health_score = monitor.health_score,
            alerts = raised.len(),
            "Performance sample recorded"
        );

        Ok(PerformanceOutcome {
            monitor,
            alerts: raised,
        })
    }

    /// Raise an alert by hand; manual alerts are never coalesced
    pub async fn trigger_alert(&self, id: &MonitorId, alert: ManualAlert) -> DomainResult<Alert> {
        if alert.message.trim().is_empty() {
            return Err(DomainError::validation("message", "Alert message is required"));
        }
        let monitor = self.load_monitor(id, false).await?;
        self.raise(
            &monitor,
            AlertIntent {
                alert_type: alert.alert_type,
                severity: alert.severity,
                message: alert.message.trim().to_string(),
                metadata: alert.metadata,
            },
            false,
        )
        .await
    }

    /// Acknowledge an open alert; it stays active until resolved
    pub async fn acknowledge_alert(
        &self,
        id: &MonitorId,
        alert_id: &AlertId,
        actor: &Actor,
    ) -> DomainResult<Alert> {
        self.load_monitor(id, false).await?;
        let alert = self.modify_open_alert(id, alert_id, |alert| alert.acknowledge(actor)).await?;

        tracing::info!(monitor_id = %id, alert_id = %alert_id, user = %actor.id, "Alert acknowledged");
        Ok(alert)
    }

    /// Resolve an open alert, acknowledged or not
    pub async fn resolve_alert(
        &self,
        id: &MonitorId,
        alert_id: &AlertId,
        actor: &Actor,
    ) -> DomainResult<Alert> {
        self.load_monitor(id, false).await?;
        let alert = self.modify_open_alert(id, alert_id, |alert| alert.resolve(actor)).await?;

        tracing::info!(monitor_id = %id, alert_id = %alert_id, user = %actor.id, "Alert resolved");
        Ok(alert)
    }

    pub async fn active_alerts(&self, id: &MonitorId) -> DomainResult<Vec<Alert>> {
        Ok(self
            .alerts
            .find_by_monitor(id)
            .await?
            .into_iter()
            .filter(Alert::is_open)
            .collect())
    }

    /// Full alert history, newest first; works on deactivated monitors too
    pub async fn alert_history(&self, id: &MonitorId, filter: &AlertHistoryFilter) -> DomainResult<Vec<Alert>> {
        self.load_monitor(id, true).await?;

        let mut history: Vec<_> = self
            .alerts
            .find_by_monitor(id)
            .await?
            .into_iter()
            .filter(|a| filter.severity.map_or(true, |s| a.severity == s))
            .filter(|a| filter.alert_type.map_or(true, |t| a.alert_type == t))
            .filter(|a| filter.resolved.map_or(true, |r| a.is_open() != r))
            .collect();
        history.reverse();

        if let Some(limit) = filter.limit {
            history.truncate(limit);
        }
        Ok(history)
    }

    /// Performance samples, newest last, optionally only the last `limit`
    pub async fn performance_history(
        &self,
        id: &MonitorId,
        limit: Option<usize>,
    ) -> DomainResult<Vec<PerformanceSample>> {
        self.load_monitor(id, true).await?;
        let mut samples = self.performance.find_by_monitor(id).await?;
        if let Some(limit) = limit {
            let skip = samples.len().saturating_sub(limit);
            samples.drain(..skip);
        }
        Ok(samples)
    }

    /// Merge new SLA targets and recompute the SLA status
    pub async fn update_sla(&self, id: &MonitorId, patch: SlaTargetsPatch) -> DomainResult<ProcessMonitor> {
        let samples = self.performance.find_by_monitor(id).await?;
        let updated = self
            .modify_monitor(id, |monitor| {
                monitor.sla_targets = monitor.sla_targets.merged(&patch)?;
                monitor.sla_status = compute_sla_status(&samples, &monitor.sla_targets, Utc::now());
                Ok(())
            })
            .await?;

        tracing::info!(
            monitor_id = %id,
            compliance = updated.sla_status.compliance_percentage,
            "SLA targets updated"
        );
        Ok(updated)
    }

    async fn load_monitor(&self, id: &MonitorId, allow_inactive: bool) -> DomainResult<ProcessMonitor> {
        self.monitors
            .find_by_id(id)
            .await?
            .filter(|m| allow_inactive || m.is_active)
            .ok_or_else(|| DomainError::not_found("ProcessMonitor", id))
    }

    async fn modify_monitor<F>(&self, id: &MonitorId, mut change: F) -> DomainResult<ProcessMonitor>
    where
        F: FnMut(&mut ProcessMonitor) -> DomainResult<()> + Send,
    {
        let mut attempt = 0;
        loop {
            let mut monitor = self.load_monitor(id, false).await?;
            change(&mut monitor)?;
            monitor.touch();

            match self.monitors.update_if_revision(&monitor).await {
                Ok(saved) => return Ok(saved),
                Err(err) if err.is_retryable() && attempt < self.options.cas_retries => {
                    attempt += 1;
                    tracing::debug!(monitor_id = %id, attempt, "Retrying monitor update");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Compare-and-swap on an open alert
    ///
    /// An alert that is missing or already resolved is no longer active and
    /// reports `EntityNotFound`, including when a concurrent caller resolved
    /// it between our read and our write.
    async fn modify_open_alert<F>(
        &self,
        id: &MonitorId,
        alert_id: &AlertId,
        mut change: F,
    ) -> DomainResult<Alert>
    where
        F: FnMut(&mut Alert) -> DomainResult<()> + Send,
    {
        let mut attempt = 0;
        loop {
            let mut alert = self
                .alerts
                .find(id, alert_id)
                .await?
                .filter(Alert::is_open)
                .ok_or_else(|| DomainError::not_found("Alert", alert_id))?;
            change(&mut alert)?;

            match self.alerts.update_if_revision(&alert).await {
                Ok(saved) => return Ok(saved),
                Err(err) if err.is_retryable() && attempt < self.options.cas_retries => {
                    attempt += 1;
                    tracing::debug!(alert_id = %alert_id, attempt, "Retrying alert update");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Store `alert` unless an open alert of its type exists, in which case
    /// that one recurs and is returned instead
    async fn insert_or_recur(&self, alert: &Alert, intent: &AlertIntent) -> DomainResult<Option<Alert>> {
        for _ in 0..=self.options.cas_retries {
            let Some(open) = self.alerts.insert_if_no_open(alert).await? else {
                return Ok(None);
            };

            let recurred = self
                .modify_open_alert(&alert.monitor_id, &open.alert_id, |existing| {
                    existing.recur(intent.message.clone(), intent.metadata.clone());
                    Ok(())
                })
                .await;
            match recurred {
                Ok(folded) => {
                    tracing::debug!(
                        monitor_id = %folded.monitor_id,
                        alert_id = %folded.alert_id,
                        occurrences = folded.occurrences,
                        "Breach folded into open alert"
                    );
                    return Ok(Some(folded));
                }
                // resolved meanwhile, try to open a fresh one
                Err(DomainError::EntityNotFound { .. }) => {}
                Err(err) => return Err(err),
            }
        }

        Err(DomainError::ConcurrencyConflict {
            resource: "Alert".to_string(),
        })
    }

    async fn raise(&self, monitor: &ProcessMonitor, intent: AlertIntent, coalesce: bool) -> DomainResult<Alert> {
        let alert = Alert::new(
            monitor.id,
            intent.alert_type,
            intent.severity,
            intent.message.clone(),
            intent.metadata.clone(),
        );

        if coalesce {
            if let Some(folded) = self.insert_or_recur(&alert, &intent).await? {
                return Ok(folded);
            }
        } else {
            self.alerts.insert(&alert).await?;
        }

        tracing::info!(
            monitor_id = %monitor.id,
            alert_id = %alert.alert_id,
            alert_type = ?alert.alert_type,
            severity = ?alert.severity,
            "Alert triggered"
        );

        if should_notify(monitor, &alert) {
            if let Err(err) = self.notifier.notify(monitor, &alert).await {
                tracing::warn!(alert_id = %alert.alert_id, "Alert notification failed: {}", err);
            }
        }

        Ok(alert)
    }
}
