//! procwatch monitoring
//!
//! Threshold evaluation, the monitor store with its alert lifecycle, health
//! and SLA calculations and dashboard rollups.
//!
//! ```text
//! MetricsSample ─► AlertEvaluator ─► AlertIntent ─► ProcessMonitorStore ─► AlertRepository
//!                                                         │
//!                                                         └─► AlertNotifier
//! ```

pub mod alerting;
pub mod dashboards;
pub mod health;
pub mod notification;
pub mod store;

pub use alerting::{AlertEvaluator, AlertIntent};
pub use dashboards::{
    DashboardSummary, MonitoringDashboardAggregator, PerformanceAverages, ProcessAlertCount,
    SlaRollup, Timeframe, TrendBucket,
};
pub use health::{compute_sla_status, health_score, status_for_score};
pub use notification::{should_notify, AlertNotifier, TracingNotifier};
pub use store::{
    AlertHistoryFilter, CreateMonitor, ManualAlert, MonitorFilter, MonitorPatch,
    MonitorStoreOptions, MonitorView, PerformanceOutcome, ProcessMonitorStore,
};
