//! Application state for the API server

use std::sync::Arc;
use std::time::{Duration, Instant};

use procwatch_config::ServiceConfig;
use procwatch_domain::{SlaTargets, Thresholds};
use procwatch_execution::{ExecutionOptions, ExecutionSimulator, ProcessCatalog};
use procwatch_monitoring::{MonitorStoreOptions, MonitoringDashboardAggregator, ProcessMonitorStore};
use procwatch_persistence::{
    InMemoryAlertRepository, InMemoryExecutionRepository, InMemoryMonitorRepository,
    InMemoryPerformanceRepository, InMemoryProcessRepository,
};

use crate::feed::MonitorFeed;

/// Application state shared across all API handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<ProcessCatalog>,
    pub simulator: Arc<ExecutionSimulator>,
    pub monitors: Arc<ProcessMonitorStore>,
    pub dashboard: Arc<MonitoringDashboardAggregator>,
    /// Server start time for uptime calculation
    pub start_time: Instant,
}

impl AppState {
    /// Wire the services over in-memory repositories
    pub fn new(config: &ServiceConfig) -> Self {
        let processes = Arc::new(InMemoryProcessRepository::new());
        let executions = Arc::new(InMemoryExecutionRepository::new());
        let monitor_repo = Arc::new(InMemoryMonitorRepository::new());
        let alerts = Arc::new(InMemoryAlertRepository::new());
        let performance = Arc::new(InMemoryPerformanceRepository::new());

        let monitors = Arc::new(ProcessMonitorStore::new(
            processes.clone(),
            monitor_repo.clone(),
            alerts.clone(),
            performance.clone(),
            store_options(config),
        ));
        let dashboard = Arc::new(MonitoringDashboardAggregator::new(
            monitor_repo,
            alerts,
            performance,
            config.monitoring.dashboard_top_n,
        ));

        let simulator = Arc::new(
            ExecutionSimulator::new(
                processes.clone(),
                executions,
                ExecutionOptions {
                    completion_delay: Duration::from_millis(config.execution.completion_delay_ms),
                    metrics_retries: config.execution.metrics_retries,
                },
            )
            .with_observer(Arc::new(MonitorFeed::new(monitors.clone()))),
        );
        let catalog = Arc::new(ProcessCatalog::new(processes, simulator.clone()));

        Self {
            catalog,
            simulator,
            monitors,
            dashboard,
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

fn store_options(config: &ServiceConfig) -> MonitorStoreOptions {
    let monitoring = &config.monitoring;
    MonitorStoreOptions {
        coalesce_duplicate_alerts: monitoring.coalesce_duplicate_alerts,
        max_performance_samples: monitoring.max_performance_samples,
        default_thresholds: Thresholds {
            max_execution_time: monitoring.thresholds.max_execution_time_ms,
            max_memory_usage: monitoring.thresholds.max_memory_usage_mb,
            max_cpu_usage: monitoring.thresholds.max_cpu_usage,
            min_success_rate: monitoring.thresholds.min_success_rate,
            max_consecutive_failures: monitoring.thresholds.max_consecutive_failures,
        },
        default_sla_targets: SlaTargets {
            availability: monitoring.sla.availability,
            response_time: monitoring.sla.response_time_ms,
            throughput: monitoring.sla.throughput_per_hour,
            error_rate: monitoring.sla.error_rate,
        },
        cas_retries: monitoring.cas_retries,
    }
}
