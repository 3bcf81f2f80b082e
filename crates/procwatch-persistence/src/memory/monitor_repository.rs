//! In-Memory Monitor Repository Implementation

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use procwatch_domain::{DomainResult, MonitorId, MonitorRepository, ProcessId, ProcessMonitor};

use super::check_revision;
use crate::error::PersistenceError;

#[derive(Debug, Default)]
pub struct InMemoryMonitorRepository {
    monitors: RwLock<HashMap<MonitorId, ProcessMonitor>>,
}

impl InMemoryMonitorRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MonitorRepository for InMemoryMonitorRepository {
    async fn insert_unique(&self, monitor: &ProcessMonitor) -> DomainResult<()> {
        let mut monitors = self.monitors.write();
        let taken = monitors
            .values()
            .any(|m| m.is_active && m.process_id == monitor.process_id);
        if taken {
            return Err(PersistenceError::Duplicate {
                entity_type: "ProcessMonitor",
                detail: format!(
                    "Monitor already exists for process {}",
                    monitor.process_id
                ),
            }
            .into());
        }
        monitors.insert(monitor.id, monitor.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &MonitorId) -> DomainResult<Option<ProcessMonitor>> {
        Ok(self.monitors.read().get(id).cloned())
    }

    async fn find_active_by_process(
        &self,
        process_id: &ProcessId,
    ) -> DomainResult<Option<ProcessMonitor>> {
        Ok(self
            .monitors
            .read()
            .values()
            .find(|m| m.is_active && m.process_id == *process_id)
            .cloned())
    }

    async fn find_all(&self) -> DomainResult<Vec<ProcessMonitor>> {
        let mut all: Vec<_> = self.monitors.read().values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn update_if_revision(&self, monitor: &ProcessMonitor) -> DomainResult<ProcessMonitor> {
        let mut monitors = self.monitors.write();
        let stored = monitors
            .get_mut(&monitor.id)
            .ok_or_else(|| PersistenceError::not_found("ProcessMonitor", monitor.id))?;
        check_revision("ProcessMonitor", monitor.id, monitor.revision, stored.revision)?;

        let mut next = monitor.clone();
        next.revision += 1;
        *stored = next.clone();
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procwatch_domain::{Actor, AlertSettings, DomainError, SlaTargets, Thresholds};

    fn monitor(process_id: ProcessId) -> ProcessMonitor {
        ProcessMonitor::new(
            process_id,
            "monitor",
            Thresholds::default(),
            AlertSettings::default(),
            SlaTargets::default(),
            &Actor::system(),
        )
    }

    #[tokio::test]
    async fn test_one_active_monitor_per_process() {
        let repo = InMemoryMonitorRepository::new();
        let process_id = ProcessId::new();
        repo.insert_unique(&monitor(process_id)).await.unwrap();

        let err = repo.insert_unique(&monitor(process_id)).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_inactive_monitor_frees_the_process() {
        let repo = InMemoryMonitorRepository::new();
        let process_id = ProcessId::new();
        let mut first = monitor(process_id);
        repo.insert_unique(&first).await.unwrap();

        first.is_active = false;
        repo.update_if_revision(&first).await.unwrap();

        repo.insert_unique(&monitor(process_id)).await.unwrap();
        let active = repo.find_active_by_process(&process_id).await.unwrap().unwrap();
        assert_ne!(active.id, first.id);
    }
}
