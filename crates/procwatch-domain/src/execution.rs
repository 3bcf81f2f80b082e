//! Execution records
//!
//! An execution is a child of its process, addressed by
//! `(process_id, execution_id)`. Its status moves from `Running` to exactly
//! one terminal state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, DomainResult};
use crate::value_objects::{Actor, ExecutionId, ProcessId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    Completed,
    Failed,
    Skipped,
}

/// Outcome of one step within an execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    pub step_id: String,
    pub name: String,
    pub status: StepStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Milliseconds
    pub duration: u64,
    #[serde(default)]
    pub output: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    pub execution_id: ExecutionId,
    pub process_id: ProcessId,
    pub triggered_by: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Milliseconds between start and end
    pub duration: Option<u64>,
    pub status: ExecutionStatus,
    pub step_results: Vec<StepResult>,
    pub error: Option<String>,
    pub revision: u64,
}

impl ExecutionRecord {
    /// Create a new `Running` record
    pub fn start(process_id: ProcessId, actor: &Actor) -> Self {
        Self {
            execution_id: ExecutionId::new(),
            process_id,
            triggered_by: actor.id.clone(),
            start_time: Utc::now(),
            end_time: None,
            duration: None,
            status: ExecutionStatus::Running,
            step_results: Vec::new(),
            error: None,
            revision: 0,
        }
    }

    pub fn complete(&mut self, step_results: Vec<StepResult>, at: DateTime<Utc>) -> DomainResult<()> {
        self.finish(ExecutionStatus::Completed, at)?;
        self.step_results = step_results;
        Ok(())
    }

    pub fn fail(&mut self, reason: impl Into<String>, at: DateTime<Utc>) -> DomainResult<()> {
        self.finish(ExecutionStatus::Failed, at)?;
        self.error = Some(reason.into());
        Ok(())
    }

    pub fn cancel(&mut self, reason: impl Into<String>, at: DateTime<Utc>) -> DomainResult<()> {
        self.finish(ExecutionStatus::Cancelled, at)?;
        self.error = Some(reason.into());
        Ok(())
    }

    fn finish(&mut self, status: ExecutionStatus, at: DateTime<Utc>) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::invalid_state(format!(
                "Execution {} already {:?}",
                self.execution_id, self.status
            )));
        }

        let end = at.max(self.start_time);
        self.status = status;
        self.end_time = Some(end);
        self.duration = Some((end - self.start_time).num_milliseconds().max(0) as u64);
        Ok(())
    }
}
