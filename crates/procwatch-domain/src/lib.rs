//! procwatch domain layer
//!
//! Entities, value objects, errors and repository contracts for automated
//! governance processes and their monitors. No storage or transport code
//! lives here.

pub mod alert;
pub mod errors;
pub mod execution;
pub mod monitor;
pub mod process;
pub mod repositories;
pub mod value_objects;

pub use alert::{Alert, AlertState, AlertType, Severity};
pub use errors::{DomainError, DomainResult};
pub use execution::{ExecutionRecord, ExecutionStatus, StepResult, StepStatus};
pub use monitor::{
    AlertChannel, AlertSettings, ChannelType, CurrentMetrics, EscalationRule, HealthStatus,
    MetricsSample, PerformanceSample, ProcessMonitor, SlaStatus, SlaTargets, SlaTargetsPatch,
    Thresholds, ThresholdsPatch,
};
pub use process::{
    normalize_steps, AutomatedProcess, ChangeLogEntry, NewProcess, Permissions, ProcessMetrics,
    ProcessPatch, ProcessStatus, ProcessStep, Schedule, StepInput,
};
pub use repositories::{
    AlertRepository, ExecutionRepository, MonitorRepository, PerformanceRepository,
    ProcessRepository,
};
pub use value_objects::{Actor, AlertId, ExecutionId, MonitorId, ProcessId};
