//! In-Memory Process Repository Implementation

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use procwatch_domain::{AutomatedProcess, DomainResult, ProcessId, ProcessRepository};

use super::check_revision;
use crate::error::PersistenceError;

/// Thread-safe in-memory implementation of ProcessRepository
#[derive(Debug, Default)]
pub struct InMemoryProcessRepository {
    processes: RwLock<HashMap<ProcessId, AutomatedProcess>>,
}

impl InMemoryProcessRepository {
    pub fn new() -> Self {
        Self {
            processes: RwLock::new(HashMap::new()),
        }
    }

    /// Get the current count of processes (for testing)
    pub fn count(&self) -> usize {
        self.processes.read().len()
    }
}

#[async_trait]
impl ProcessRepository for InMemoryProcessRepository {
    async fn insert(&self, process: &AutomatedProcess) -> DomainResult<()> {
        let mut processes = self.processes.write();
        if processes.contains_key(&process.id) {
            return Err(PersistenceError::Duplicate {
                entity_type: "AutomatedProcess",
                detail: format!("process {} already exists", process.id),
            }
            .into());
        }
        processes.insert(process.id, process.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &ProcessId) -> DomainResult<Option<AutomatedProcess>> {
        Ok(self.processes.read().get(id).cloned())
    }

    async fn find_all(&self) -> DomainResult<Vec<AutomatedProcess>> {
        let mut all: Vec<_> = self.processes.read().values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn update_if_revision(&self, process: &AutomatedProcess) -> DomainResult<AutomatedProcess> {
        let mut processes = self.processes.write();
        let stored = processes
            .get_mut(&process.id)
            .ok_or_else(|| PersistenceError::not_found("AutomatedProcess", process.id))?;
        check_revision("AutomatedProcess", process.id, process.revision, stored.revision)?;

        let mut next = process.clone();
        next.revision += 1;
        *stored = next.clone();
        Ok(next)
    }
}
