//! Automated process catalog

use std::sync::Arc;

use serde::Deserialize;

use procwatch_domain::{
    Actor, AutomatedProcess, DomainError, DomainResult, NewProcess, ProcessId, ProcessPatch,
    ProcessRepository, ProcessStatus,
};

use crate::simulator::ExecutionSimulator;

const CAS_RETRIES: usize = 3;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessFilter {
    pub status: Option<ProcessStatus>,
    pub category: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
}

/// Create, read, update and soft-delete automated processes
///
/// Taking a process out of service (deactivation, archiving or deletion)
/// cancels its in-flight executions.
pub struct ProcessCatalog {
    processes: Arc<dyn ProcessRepository>,
    simulator: Arc<ExecutionSimulator>,
}

impl ProcessCatalog {
    pub fn new(processes: Arc<dyn ProcessRepository>, simulator: Arc<ExecutionSimulator>) -> Self {
        Self {
            processes,
            simulator,
        }
    }

    pub async fn create(&self, input: NewProcess, actor: &Actor) -> DomainResult<AutomatedProcess> {
        self.check_dependencies(&input.dependencies).await?;
        let process = AutomatedProcess::create(input, actor)?;
        self.processes.insert(&process).await?;

        tracing::info!(
            process_id = %process.id,
            name = %process.name,
            steps = process.steps.len(),
            "Process created"
        );
        Ok(process)
    }

    pub async fn get(&self, id: &ProcessId) -> DomainResult<AutomatedProcess> {
        self.processes
            .find_by_id(id)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| DomainError::not_found("AutomatedProcess", id))
    }

    /// Newest first
    pub async fn list(&self, filter: &ProcessFilter) -> DomainResult<Vec<AutomatedProcess>> {
        let mut processes: Vec<_> = self
            .processes
            .find_all()
            .await?
            .into_iter()
            .filter(|p| filter.include_inactive || p.is_active)
            .filter(|p| filter.status.map_or(true, |s| p.status == s))
            .filter(|p| {
                filter
                    .category
                    .as_deref()
                    .map_or(true, |c| p.category.eq_ignore_ascii_case(c))
            })
            .collect();
        processes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(processes)
    }

    pub async fn update(&self, id: &ProcessId, patch: ProcessPatch, actor: &Actor) -> DomainResult<AutomatedProcess> {
        if let Some(dependencies) = &patch.dependencies {
            self.check_dependencies(dependencies).await?;
        }

        let mut attempt = 0;
        let (updated, previous) = loop {
            let mut process = self.get(id).await?;
            let previous = process.apply(patch.clone(), actor)?;

            match self.processes.update_if_revision(&process).await {
                Ok(saved) => break (saved, previous),
                Err(err) if err.is_retryable() && attempt < CAS_RETRIES => {
                    attempt += 1;
                    tracing::debug!(process_id = %id, attempt, "Retrying process update");
                }
                Err(err) => return Err(err),
            }
        };

        if previous == ProcessStatus::Active && updated.status != ProcessStatus::Active {
            self.simulator.cancel_for_process(id);
        }

        tracing::info!(process_id = %id, version = updated.version, "Process updated");
        Ok(updated)
    }

    /// Mark the process deleted; the record stays for history queries
    pub async fn soft_delete(&self, id: &ProcessId, actor: &Actor) -> DomainResult<AutomatedProcess> {
        let mut attempt = 0;
        let deleted = loop {
            let mut process = self.get(id).await?;
            process.deactivate(actor);

            match self.processes.update_if_revision(&process).await {
                Ok(saved) => break saved,
                Err(err) if err.is_retryable() && attempt < CAS_RETRIES => {
                    attempt += 1;
                    tracing::debug!(process_id = %id, attempt, "Retrying process delete");
                }
                Err(err) => return Err(err),
            }
        };

        self.simulator.cancel_for_process(id);
        tracing::info!(process_id = %id, user = %actor.id, "Process deleted");
        Ok(deleted)
    }

    async fn check_dependencies(&self, dependencies: &[ProcessId]) -> DomainResult<()> {
        for dependency in dependencies {
            let known = self
                .processes
                .find_by_id(dependency)
                .await?
                .map_or(false, |p| p.is_active);
            if !known {
                return Err(DomainError::validation(
                    "dependencies",
                    format!("Unknown process {}", dependency),
                ));
            }
        }
        Ok(())
    }
}
