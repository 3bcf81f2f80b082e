//! End-to-end flows across the catalog, simulator, monitor store and dashboard
//!
//! Services are wired exactly as the server wires them, from a configuration
//! file on disk.

use std::io::Write;

use chrono::Utc;
use procwatch_api::AppState;
use procwatch_config::{ConfigManager, ServiceConfig};
use procwatch_domain::{
    Actor, AlertType, ExecutionStatus, HealthStatus, MetricsSample, NewProcess, ProcessPatch,
    ProcessStatus, StepInput,
};
use procwatch_execution::ProcessFilter;
use procwatch_monitoring::{AlertHistoryFilter, CreateMonitor, Timeframe};
use tempfile::NamedTempFile;

fn load_config(prefix: &str) -> ServiceConfig {
    let mut file = NamedTempFile::new().expect("Failed to create temp config");
    writeln!(
        file,
        r#"
[execution]
completion_delay_ms = 10

[monitoring]
dashboard_top_n = 3

[monitoring.thresholds]
max_execution_time_ms = 60000
"#
    )
    .expect("Failed to write temp config");

    ConfigManager::with_path(file.path())
        .with_env_prefix(prefix)
        .load()
        .expect("Failed to load config")
}

fn steward() -> Actor {
    Actor::new("steward-12", Some("steward12@example.com".to_string()))
}

fn access_review() -> NewProcess {
    NewProcess {
        name: "Quarterly access review".to_string(),
        category: "Access Governance".to_string(),
        steps: vec![
            StepInput::new("export"),
            StepInput::new("review"),
            StepInput::new("revoke"),
        ],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_execution_lifecycle_feeds_monitoring() {
    let config = load_config("PROCWATCH_E2E_LIFECYCLE");
    assert_eq!(config.monitoring.thresholds.max_execution_time_ms, 60_000);
    let state = AppState::new(&config);
    let actor = steward();

    let process = state.catalog.create(access_review(), &actor).await.unwrap();
    let monitor = state
        .monitors
        .create_monitor(
            CreateMonitor {
                process_id: process.id,
                ..Default::default()
            },
            &actor,
        )
        .await
        .unwrap();
    assert_eq!(monitor.thresholds.max_execution_time, 60_000);

    let started = state.simulator.start_execution(&process.id, &actor).await.unwrap();
    assert_eq!(started.status, ExecutionStatus::Running);

    let finished = state
        .simulator
        .wait_for(&process.id, &started.execution_id)
        .await
        .unwrap();
    assert_eq!(finished.status, ExecutionStatus::Completed);
    assert_eq!(finished.step_results.len(), 3);

    let process = state.catalog.get(&process.id).await.unwrap();
    assert_eq!(process.metrics.total_executions, 1);
    assert_eq!(process.metrics.successful_executions, 1);

    let samples = state.monitors.performance_history(&monitor.id, None).await.unwrap();
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].metrics.success_count, Some(1));

    let view = state.monitors.view(&monitor.id).await.unwrap();
    assert!(view.active_alerts.is_empty());
    assert_eq!(view.monitor.current_metrics.status, HealthStatus::Healthy);

    let summary = state.dashboard.summarize(Timeframe::Day, Utc::now()).await.unwrap();
    assert_eq!(summary.total_monitors, 1);
    assert_eq!(summary.averages.samples, 1);
    assert_eq!(summary.open_alerts, 0);
}

#[tokio::test]
async fn test_breaches_show_up_on_the_dashboard() {
    let config = load_config("PROCWATCH_E2E_BREACH");
    let state = AppState::new(&config);
    let actor = steward();

    let process = state.catalog.create(access_review(), &actor).await.unwrap();
    let monitor = state
        .monitors
        .create_monitor(
            CreateMonitor {
                process_id: process.id,
                ..Default::default()
            },
            &actor,
        )
        .await
        .unwrap();

    let outcome = state
        .monitors
        .add_performance_data(
            &monitor.id,
            MetricsSample {
                execution_time: Some(90_000),
                cpu_usage: Some(97.5),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    let mut raised: Vec<AlertType> = outcome.alerts.iter().map(|a| a.alert_type).collect();
    raised.sort_by_key(|t| format!("{:?}", t));
    assert_eq!(raised, vec![AlertType::CpuThreshold, AlertType::ExecutionTimeout]);

    let summary = state.dashboard.summarize(Timeframe::Hour, Utc::now()).await.unwrap();
    assert_eq!(summary.open_alerts, 2);
    assert_eq!(summary.alerts_in_window, 2);
    assert_eq!(summary.top_processes_by_open_alerts[0].open_alerts, 2);

    let timeout = outcome
        .alerts
        .iter()
        .find(|a| a.alert_type == AlertType::ExecutionTimeout)
        .unwrap();
    state
        .monitors
        .resolve_alert(&monitor.id, &timeout.alert_id, &actor)
        .await
        .unwrap();

    let history = state
        .monitors
        .alert_history(
            &monitor.id,
            &AlertHistoryFilter {
                resolved: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(state.monitors.active_alerts(&monitor.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_archiving_a_process_cancels_its_runs() {
    let mut config = load_config("PROCWATCH_E2E_ARCHIVE");
    config.execution.completion_delay_ms = 60_000;
    let state = AppState::new(&config);
    let actor = steward();

    let process = state.catalog.create(access_review(), &actor).await.unwrap();
    let run = state.simulator.start_execution(&process.id, &actor).await.unwrap();

    state
        .catalog
        .update(
            &process.id,
            ProcessPatch {
                status: Some(ProcessStatus::Archived),
                ..Default::default()
            },
            &actor,
        )
        .await
        .unwrap();

    let finished = state
        .simulator
        .wait_for(&process.id, &run.execution_id)
        .await
        .unwrap();
    assert_eq!(finished.status, ExecutionStatus::Cancelled);
    assert_eq!(state.simulator.in_flight(), 0);

    let listed = state
        .catalog
        .list(&ProcessFilter {
            status: Some(ProcessStatus::Archived),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
}
