//! Simulated process execution
//!
//! A started execution is stored as `Running` right away. A background task
//! completes it after a fixed delay unless it is cancelled first. The
//! terminal write is a compare-and-swap on the record's revision, so a
//! completion that races a cancellation is dropped instead of overwriting it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use serde_json::json;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use procwatch_domain::{
    Actor, AutomatedProcess, DomainError, DomainResult, ExecutionId, ExecutionRecord,
    ExecutionRepository, ExecutionStatus, ProcessId, ProcessRepository,
    StepResult, StepStatus,
};

#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Time between start and simulated completion
    pub completion_delay: Duration,
    /// Attempts at folding a finished run into the process metrics
    pub metrics_retries: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            completion_delay: Duration::from_millis(5_000),
            metrics_retries: 3,
        }
    }
}

/// Receives every execution that reached a terminal state
#[async_trait]
pub trait ExecutionObserver: Send + Sync {
    async fn execution_finished(&self, process: &AutomatedProcess, execution: &ExecutionRecord);
}

struct InFlight {
    process_id: ProcessId,
    token: CancellationToken,
    done: watch::Receiver<ExecutionStatus>,
}

#[derive(Clone)]
pub struct ExecutionSimulator {
    processes: Arc<dyn ProcessRepository>,
    executions: Arc<dyn ExecutionRepository>,
    in_flight: Arc<DashMap<ExecutionId, InFlight>>,
    observer: Option<Arc<dyn ExecutionObserver>>,
    options: ExecutionOptions,
}

impl ExecutionSimulator {
    pub fn new(
        processes: Arc<dyn ProcessRepository>,
        executions: Arc<dyn ExecutionRepository>,
        options: ExecutionOptions,
    ) -> Self {
        Self {
            processes,
            executions,
            in_flight: Arc::new(DashMap::new()),
            observer: None,
            options,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Number of executions still waiting for completion
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Start a run of an active process
    ///
    /// Returns the stored `Running` record; completion happens in the
    /// background.
    ///
    /// # Errors
    /// `EntityNotFound` if the process is missing or deleted, `InvalidState`
    /// if it is not `Active`. No record is created in either case.
    pub async fn start_execution(&self, process_id: &ProcessId, actor: &Actor) -> DomainResult<ExecutionRecord> {
        let process = self
            .processes
            .find_by_id(process_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| DomainError::not_found("AutomatedProcess", process_id))?;

        if !process.is_runnable() {
            return Err(DomainError::invalid_state(format!(
                "Process '{}' is {:?} and cannot be executed",
                process.name, process.status
            )));
        }

        let record = ExecutionRecord::start(process.id, actor);
        self.executions.insert(&record).await?;

        let token = CancellationToken::new();
        let (tx, rx) = watch::channel(ExecutionStatus::Running);
        self.in_flight.insert(
            record.execution_id,
            InFlight {
                process_id: process.id,
                token: token.clone(),
                done: rx,
            },
        );

        let this = self.clone();
        let (pid, eid) = (process.id, record.execution_id);
        tokio::spawn(async move {
            this.run(pid, eid, token, tx).await;
        });

        tracing::info!(
            process_id = %process.id,
            execution_id = %record.execution_id,
            user = %actor.id,
            "Execution started"
        );
        Ok(record)
    }

    /// Cancel one in-flight execution; returns false when nothing was running
    pub fn cancel_execution(&self, execution_id: &ExecutionId) -> bool {
        match self.in_flight.get(execution_id) {
            Some(entry) => {
                entry.token.cancel();
                tracing::info!(execution_id = %execution_id, "Execution cancellation requested");
                true
            }
            None => false,
        }
    }

    /// Cancel every in-flight execution of a process
    pub fn cancel_for_process(&self, process_id: &ProcessId) -> usize {
        let mut cancelled = 0;
        for entry in self.in_flight.iter() {
            if entry.process_id == *process_id {
                entry.token.cancel();
                cancelled += 1;
            }
        }

        if cancelled > 0 {
            tracing::info!(process_id = %process_id, cancelled, "Cancelled in-flight executions");
        }
        cancelled
    }

    /// Wait until the execution is terminal, then return the stored record
    pub async fn wait_for(&self, process_id: &ProcessId, execution_id: &ExecutionId) -> DomainResult<ExecutionRecord> {
        let done = self.in_flight.get(execution_id).map(|e| e.done.clone());
        if let Some(mut done) = done {
            // a closed channel means the task is gone; the store has the answer
            let _ = done.wait_for(|status| status.is_terminal()).await;
        }

        self.executions
            .find(process_id, execution_id)
            .await?
            .ok_or_else(|| DomainError::not_found("ExecutionRecord", execution_id))
    }

    /// Execution history of a process, newest first
    pub async fn list_executions(
        &self,
        process_id: &ProcessId,
        limit: Option<usize>,
    ) -> DomainResult<Vec<ExecutionRecord>> {
        if self.processes.find_by_id(process_id).await?.is_none() {
            return Err(DomainError::not_found("AutomatedProcess", process_id));
        }

        let mut runs = self.executions.find_by_process(process_id).await?;
        if let Some(limit) = limit {
            runs.truncate(limit);
        }
        Ok(runs)
    }

    async fn run(
        &self,
        process_id: ProcessId,
        execution_id: ExecutionId,
        token: CancellationToken,
        done: watch::Sender<ExecutionStatus>,
    ) {
        let cancelled = tokio::select! {
            _ = tokio::time::sleep(self.options.completion_delay) => false,
            _ = token.cancelled() => true,
        };

        let status = match self.finish(process_id, execution_id, cancelled).await {
            Ok(Some(record)) => record.status,
            Ok(None) => self
                .executions
                .find(&process_id, &execution_id)
                .await
                .ok()
                .flatten()
                .map_or(ExecutionStatus::Failed, |r| r.status),
            Err(err) => {
                tracing::error!(
                    execution_id = %execution_id,
                    error = %err,
                    "Execution completion failed"
                );
                ExecutionStatus::Failed
            }
        };

        done.send_replace(status);
        self.in_flight.remove(&execution_id);
    }

    /// Apply the terminal transition; `None` when another writer got there first
    async fn finish(
        &self,
        process_id: ProcessId,
        execution_id: ExecutionId,
        cancelled: bool,
    ) -> DomainResult<Option<ExecutionRecord>> {
        let Some(mut record) = self.executions.find(&process_id, &execution_id).await? else {
            tracing::warn!(execution_id = %execution_id, "Execution record vanished before completion");
            return Ok(None);
        };
        if record.status.is_terminal() {
            tracing::debug!(execution_id = %execution_id, status = ?record.status, "Execution already finished");
            return Ok(None);
        }

        let now = Utc::now();
        let process = self.processes.find_by_id(&process_id).await?;
        if cancelled {
            record.cancel("Execution cancelled", now)?;
        } else {
            match &process {
                Some(p) if p.is_active => {
                    let steps = synthetic_step_results(p, record.start_time, now);
                    record.complete(steps, now)?;
                }
                _ => record.fail("Process no longer exists", now)?,
            }
        }

        let saved = match self.executions.update_if_revision(&record).await {
            Ok(saved) => saved,
            Err(err) if err.is_retryable() => {
                tracing::warn!(
                    execution_id = %execution_id,
                    "Execution changed concurrently, completion dropped"
                );
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        tracing::info!(
            process_id = %process_id,
            execution_id = %execution_id,
            status = ?saved.status,
            duration_ms = saved.duration.unwrap_or(0),
            "Execution finished"
        );

        self.record_metrics(&saved).await;
        if let (Some(observer), Some(process)) = (&self.observer, process) {
            observer.execution_finished(&process, &saved).await;
        }
        Ok(Some(saved))
    }

    async fn record_metrics(&self, execution: &ExecutionRecord) {
        for attempt in 0..=self.options.metrics_retries {
            let mut process = match self.processes.find_by_id(&execution.process_id).await {
                Ok(Some(process)) => process,
                Ok(None) => return,
                Err(err) => {
                    tracing::warn!(process_id = %execution.process_id, error = %err, "Could not load process metrics");
                    return;
                }
            };
            process.metrics.record(execution);

            match self.processes.update_if_revision(&process).await {
                Ok(_) => return,
                Err(err) if err.is_retryable() => {
                    tracing::debug!(process_id = %execution.process_id, attempt, "Retrying metrics update");
                }
                Err(err) => {
                    tracing::warn!(process_id = %execution.process_id, error = %err, "Could not save process metrics");
                    return;
                }
            }
        }

        tracing::warn!(
            process_id = %execution.process_id,
            execution_id = %execution.execution_id,
            "Gave up folding execution into process metrics"
        );
    }
}

/// One completed result per step, splitting the run time evenly
fn synthetic_step_results(
    process: &AutomatedProcess,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<StepResult> {
    if process.steps.is_empty() {
        return Vec::new();
    }

    let total = (end - start).num_milliseconds().max(0);
    let slice = total / process.steps.len() as i64;

    process
        .steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let step_start = start + TimeDelta::milliseconds(slice * i as i64);
            StepResult {
                step_id: step.step_id.clone(),
                name: step.name.clone(),
                status: StepStatus::Completed,
                start_time: step_start,
                end_time: step_start + TimeDelta::milliseconds(slice),
                duration: slice as u64,
                output: json!({ "message": format!("Step '{}' completed", step.name) }),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use procwatch_domain::{NewProcess, StepInput};

    #[test]
    fn test_step_results_follow_step_order() {
        let process = AutomatedProcess::create(
            NewProcess {
                name: "Review".to_string(),
                category: "audit".to_string(),
                steps: vec![StepInput::new("collect"), StepInput::new("approve")],
                ..Default::default()
            },
            &Actor::system(),
        )
        .unwrap();
        let start = Utc::now();
        let results = synthetic_step_results(&process, start, start + TimeDelta::milliseconds(1_000));

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].step_id, "collect");
        assert_eq!(results[1].step_id, "approve");
        assert_eq!(results[0].duration, 500);
        assert_eq!(results[1].start_time, results[0].end_time);
        assert!(results.iter().all(|r| r.status == StepStatus::Completed));
    }

    #[test]
    fn test_no_steps_no_results() {
        let process = AutomatedProcess::create(
            NewProcess {
                name: "Empty".to_string(),
                category: "audit".to_string(),
                ..Default::default()
            },
            &Actor::system(),
        )
        .unwrap();
        let now = Utc::now();
        assert!(synthetic_step_results(&process, now, now).is_empty());
    }
}
