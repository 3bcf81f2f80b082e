//! Feeds finished executions into the process's monitor

use std::sync::Arc;

use async_trait::async_trait;
use procwatch_domain::{AutomatedProcess, ExecutionRecord, ExecutionStatus, MetricsSample};
use procwatch_execution::ExecutionObserver;
use procwatch_monitoring::ProcessMonitorStore;

/// Records every completed or failed run as a performance sample on the
/// process's active monitor, if it has one
pub struct MonitorFeed {
    monitors: Arc<ProcessMonitorStore>,
}

impl MonitorFeed {
    pub fn new(monitors: Arc<ProcessMonitorStore>) -> Self {
        Self { monitors }
    }
}

#[async_trait]
impl ExecutionObserver for MonitorFeed {
    async fn execution_finished(&self, process: &AutomatedProcess, execution: &ExecutionRecord) {
        let succeeded = match execution.status {
            ExecutionStatus::Completed => true,
            ExecutionStatus::Failed => false,
            ExecutionStatus::Running | ExecutionStatus::Cancelled => return,
        };

        let monitor = match self.monitors.active_monitor_for(&process.id).await {
            Ok(Some(monitor)) => monitor,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(process_id = %process.id, error = %err, "Could not look up monitor");
                return;
            }
        };

        let sample = MetricsSample {
            execution_time: execution.duration,
            success_count: Some(u64::from(succeeded)),
            error_count: Some(u64::from(!succeeded)),
            ..Default::default()
        };
        if let Err(err) = self.monitors.add_performance_data(&monitor.id, sample, None).await {
            tracing::warn!(
                monitor_id = %monitor.id,
                execution_id = %execution.execution_id,
                error = %err,
                "Could not record execution on monitor"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use procwatch_domain::{Actor, NewProcess, ProcessRepository};
    use procwatch_monitoring::{CreateMonitor, MonitorStoreOptions};
    use procwatch_persistence::{
        InMemoryAlertRepository, InMemoryMonitorRepository, InMemoryPerformanceRepository,
        InMemoryProcessRepository,
    };

    #[tokio::test]
    async fn test_finished_run_lands_on_the_active_monitor() {
        let processes = Arc::new(InMemoryProcessRepository::new());
        let store = Arc::new(ProcessMonitorStore::new(
            processes.clone(),
            Arc::new(InMemoryMonitorRepository::new()),
            Arc::new(InMemoryAlertRepository::new()),
            Arc::new(InMemoryPerformanceRepository::new()),
            MonitorStoreOptions::default(),
        ));
        let actor = Actor::system();
        let process = AutomatedProcess::create(
            NewProcess {
                name: "Consent audit".to_string(),
                category: "Privacy".to_string(),
                ..Default::default()
            },
            &actor,
        )
        .unwrap();
        processes.insert(&process).await.unwrap();

        let input = CreateMonitor {
            process_id: process.id,
            ..Default::default()
        };
        let retired = store.create_monitor(input.clone(), &actor).await.unwrap();
        store.soft_delete(&retired.id).await.unwrap();
        let current = store.create_monitor(input, &actor).await.unwrap();

        let mut run = ExecutionRecord::start(process.id, &actor);
        run.complete(Vec::new(), Utc::now()).unwrap();
        MonitorFeed::new(store.clone())
            .execution_finished(&process, &run)
            .await;

        assert_eq!(store.performance_history(&current.id, None).await.unwrap().len(), 1);
        assert!(store.performance_history(&retired.id, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unmonitored_process_is_ignored() {
        let store = Arc::new(ProcessMonitorStore::new(
            Arc::new(InMemoryProcessRepository::new()),
            Arc::new(InMemoryMonitorRepository::new()),
            Arc::new(InMemoryAlertRepository::new()),
            Arc::new(InMemoryPerformanceRepository::new()),
            MonitorStoreOptions::default(),
        ));
        let actor = Actor::system();
        let process = AutomatedProcess::create(
            NewProcess {
                name: "Consent audit".to_string(),
                category: "Privacy".to_string(),
                ..Default::default()
            },
            &actor,
        )
        .unwrap();

        let mut run = ExecutionRecord::start(process.id, &actor);
        run.fail("boom", Utc::now()).unwrap();
        MonitorFeed::new(store.clone())
            .execution_finished(&process, &run)
            .await;

        assert!(store.active_monitor_for(&process.id).await.unwrap().is_none());
    }
}
