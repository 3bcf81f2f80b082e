//! Repository interfaces for data persistence
//!
//! Child records (executions, alerts, performance samples) have their own
//! repositories addressed by `(parent id, child id)` so that updating one
//! child never rewrites its siblings.
//!
//! Every `update_if_revision` is a compare-and-swap: the write succeeds only
//! when the stored revision equals the revision of the value passed in, and
//! the stored copy (returned) carries the next revision. A stale write fails
//! with `DomainError::ConcurrencyConflict`.

use async_trait::async_trait;

use crate::{
    alert::Alert,
    errors::DomainResult,
    execution::ExecutionRecord,
    monitor::{PerformanceSample, ProcessMonitor},
    process::AutomatedProcess,
    value_objects::*,
};

/// Repository for automated processes
#[async_trait]
pub trait ProcessRepository: Send + Sync {
    async fn insert(&self, process: &AutomatedProcess) -> DomainResult<()>;

    async fn find_by_id(&self, id: &ProcessId) -> DomainResult<Option<AutomatedProcess>>;

    /// All processes, soft-deleted ones included
    async fn find_all(&self) -> DomainResult<Vec<AutomatedProcess>>;

    async fn update_if_revision(&self, process: &AutomatedProcess) -> DomainResult<AutomatedProcess>;
}

/// Repository for execution records
#[async_trait]
pub trait ExecutionRepository: Send + Sync {
    async fn insert(&self, execution: &ExecutionRecord) -> DomainResult<()>;

    async fn find(
        &self,
        process_id: &ProcessId,
        execution_id: &ExecutionId,
    ) -> DomainResult<Option<ExecutionRecord>>;

    /// Executions of one process, newest first
    async fn find_by_process(&self, process_id: &ProcessId) -> DomainResult<Vec<ExecutionRecord>>;

    async fn update_if_revision(&self, execution: &ExecutionRecord) -> DomainResult<ExecutionRecord>;
}

/// Repository for process monitors
#[async_trait]
pub trait MonitorRepository: Send + Sync {
    /// Insert unless an active monitor already exists for the same process
    ///
    /// The check and the insert are atomic; a duplicate fails with
    /// `DomainError::Conflict`.
    async fn insert_unique(&self, monitor: &ProcessMonitor) -> DomainResult<()>;

    async fn find_by_id(&self, id: &MonitorId) -> DomainResult<Option<ProcessMonitor>>;

    async fn find_active_by_process(
        &self,
        process_id: &ProcessId,
    ) -> DomainResult<Option<ProcessMonitor>>;

    /// All monitors, soft-deleted ones included
    async fn find_all(&self) -> DomainResult<Vec<ProcessMonitor>>;

    async fn update_if_revision(&self, monitor: &ProcessMonitor) -> DomainResult<ProcessMonitor>;
}

/// Repository for alerts; history is append-only
#[async_trait]
pub trait AlertRepository: Send + Sync {
    async fn insert(&self, alert: &Alert) -> DomainResult<()>;

    /// Insert unless the monitor already has an open alert of the same type
    ///
    /// The check and the insert are atomic. Returns the open alert that
    /// blocked the insert, or `None` when `alert` was stored.
    async fn insert_if_no_open(&self, alert: &Alert) -> DomainResult<Option<Alert>>;

    async fn find(&self, monitor_id: &MonitorId, alert_id: &AlertId) -> DomainResult<Option<Alert>>;

    /// Alerts of one monitor in trigger order
    async fn find_by_monitor(&self, monitor_id: &MonitorId) -> DomainResult<Vec<Alert>>;

    async fn find_all(&self) -> DomainResult<Vec<Alert>>;

    async fn update_if_revision(&self, alert: &Alert) -> DomainResult<Alert>;
}

/// Repository for the per-monitor performance time series
#[async_trait]
pub trait PerformanceRepository: Send + Sync {
    /// Append a sample, dropping the oldest entries beyond `retain`
    async fn append(
        &self,
        monitor_id: &MonitorId,
        sample: PerformanceSample,
        retain: usize,
    ) -> DomainResult<()>;

    /// Samples of one monitor, oldest first
    async fn find_by_monitor(&self, monitor_id: &MonitorId) -> DomainResult<Vec<PerformanceSample>>;
}
