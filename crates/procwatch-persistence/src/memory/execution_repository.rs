//! In-Memory Execution Repository Implementation

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use procwatch_domain::{
    DomainResult, ExecutionId, ExecutionRecord, ExecutionRepository, ProcessId,
};

use super::check_revision;
use crate::error::PersistenceError;

/// Executions grouped by their parent process
#[derive(Debug, Default)]
pub struct InMemoryExecutionRepository {
    executions: RwLock<HashMap<ProcessId, HashMap<ExecutionId, ExecutionRecord>>>,
}

impl InMemoryExecutionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExecutionRepository for InMemoryExecutionRepository {
    async fn insert(&self, execution: &ExecutionRecord) -> DomainResult<()> {
        self.executions
            .write()
            .entry(execution.process_id)
            .or_default()
            .insert(execution.execution_id, execution.clone());
        Ok(())
    }

    async fn find(
        &self,
        process_id: &ProcessId,
        execution_id: &ExecutionId,
    ) -> DomainResult<Option<ExecutionRecord>> {
        Ok(self
            .executions
            .read()
            .get(process_id)
            .and_then(|runs| runs.get(execution_id))
            .cloned())
    }

    async fn find_by_process(&self, process_id: &ProcessId) -> DomainResult<Vec<ExecutionRecord>> {
        let mut runs: Vec<_> = self
            .executions
            .read()
            .get(process_id)
            .map(|runs| runs.values().cloned().collect())
            .unwrap_or_default();
        runs.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(runs)
    }

    async fn update_if_revision(&self, execution: &ExecutionRecord) -> DomainResult<ExecutionRecord> {
        let mut executions = self.executions.write();
        let stored = executions
            .get_mut(&execution.process_id)
            .and_then(|runs| runs.get_mut(&execution.execution_id))
            .ok_or_else(|| PersistenceError::not_found("ExecutionRecord", execution.execution_id))?;
        check_revision(
            "ExecutionRecord",
            execution.execution_id,
            execution.revision,
            stored.revision,
        )?;

        let mut next = execution.clone();
        next.revision += 1;
        *stored = next.clone();
        Ok(next)
    }
}
