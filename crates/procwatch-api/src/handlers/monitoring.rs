//! Process monitoring API handlers

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use procwatch_domain::{
    Alert, AlertId, DomainError, MonitorId, PerformanceSample, ProcessMonitor, SlaTargetsPatch,
};
use procwatch_monitoring::{
    CreateMonitor, DashboardSummary, ManualAlert, MonitorPatch, MonitorView, PerformanceOutcome,
    Timeframe,
};

use crate::{
    error::ApiResult,
    extract::{ApiJson, ApiPath, ApiQuery, CurrentUser},
    models::{
        AlertHistoryQuery, ApiResponse, DashboardQuery, LimitQuery, ListMonitorsQuery,
        PerformanceDataRequest,
    },
    state::AppState,
};

/// List monitors
#[utoipa::path(
    get,
    path = "/api/v1/process-monitoring",
    params(ListMonitorsQuery),
    responses(
        (status = 200, description = "Monitors", body = serde_json::Value),
        (status = 400, description = "Invalid query")
    )
)]
pub async fn list_monitors(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListMonitorsQuery>,
) -> ApiResult<Json<ApiResponse<Vec<ProcessMonitor>>>> {
    let monitors = state.monitors.list_monitors(&query.into()).await?;
    Ok(Json(ApiResponse::ok(monitors)))
}

/// Get a monitor with its active alerts
#[utoipa::path(
    get,
    path = "/api/v1/process-monitoring/{id}",
    params(("id" = String, Path, description = "Monitor id")),
    responses(
        (status = 200, description = "Monitor", body = serde_json::Value),
        (status = 404, description = "Monitor not found")
    )
)]
pub async fn get_monitor(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<MonitorId>,
) -> ApiResult<Json<ApiResponse<MonitorView>>> {
    let view = state.monitors.view(&id).await?;
    Ok(Json(ApiResponse::ok(view)))
}

/// Attach a monitor to a process
#[utoipa::path(
    post,
    path = "/api/v1/process-monitoring",
    request_body = serde_json::Value,
    responses(
        (status = 201, description = "Monitor created", body = serde_json::Value),
        (status = 400, description = "Invalid request or process already monitored"),
        (status = 404, description = "Process not found")
    )
)]
pub async fn create_monitor(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(input): ApiJson<CreateMonitor>,
) -> ApiResult<(StatusCode, Json<ApiResponse<ProcessMonitor>>)> {
    let monitor = state.monitors.create_monitor(input, &user).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(monitor, "Process monitor created successfully")),
    ))
}

/// Update a monitor's name, thresholds or alert settings
#[utoipa::path(
    put,
    path = "/api/v1/process-monitoring/{id}",
    params(("id" = String, Path, description = "Monitor id")),
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Monitor updated", body = serde_json::Value),
        (status = 400, description = "Invalid update"),
        (status = 404, description = "Monitor not found")
    )
)]
pub async fn update_monitor(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<MonitorId>,
    ApiJson(patch): ApiJson<MonitorPatch>,
) -> ApiResult<Json<ApiResponse<ProcessMonitor>>> {
    let monitor = state.monitors.update_monitor(&id, patch).await?;
    Ok(Json(ApiResponse::with_message(monitor, "Process monitor updated successfully")))
}

/// Deactivate a monitor
#[utoipa::path(
    delete,
    path = "/api/v1/process-monitoring/{id}",
    params(("id" = String, Path, description = "Monitor id")),
    responses(
        (status = 200, description = "Monitor deactivated", body = serde_json::Value),
        (status = 404, description = "Monitor not found")
    )
)]
pub async fn delete_monitor(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<MonitorId>,
) -> ApiResult<Json<ApiResponse<ProcessMonitor>>> {
    let monitor = state.monitors.soft_delete(&id).await?;
    Ok(Json(ApiResponse::with_message(monitor, "Process monitor deleted successfully")))
}

/// Rollups across active monitors
#[utoipa::path(
    get,
    path = "/api/v1/process-monitoring/analytics/dashboard",
    params(DashboardQuery),
    responses(
        (status = 200, description = "Dashboard summary", body = serde_json::Value),
        (status = 400, description = "Unsupported timeframe")
    )
)]
pub async fn dashboard(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> ApiResult<Json<ApiResponse<DashboardSummary>>> {
    let timeframe = match query.timeframe.as_deref() {
        Some(raw) => raw.parse::<Timeframe>()?,
        None => Timeframe::default(),
    };
    let summary = state.dashboard.summarize(timeframe, Utc::now()).await?;
    Ok(Json(ApiResponse::ok(summary)))
}

/// Record a performance sample
#[utoipa::path(
    post,
    path = "/api/v1/process-monitoring/{id}/performance",
    params(("id" = String, Path, description = "Monitor id")),
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Sample recorded; includes any alerts raised", body = serde_json::Value),
        (status = 400, description = "Empty or invalid sample"),
        (status = 404, description = "Monitor not found")
    )
)]
pub async fn add_performance_data(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<MonitorId>,
    ApiJson(request): ApiJson<PerformanceDataRequest>,
) -> ApiResult<Json<ApiResponse<PerformanceOutcome>>> {
    let metrics = &request.metrics;
    let reported = metrics.execution_time.is_some()
        || metrics.memory_usage.is_some()
        || metrics.cpu_usage.is_some()
        || metrics.error_count.is_some()
        || metrics.success_count.is_some();
    if !reported && request.status.is_none() {
        return Err(DomainError::validation("metrics", "At least one metric is required").into());
    }
    for (field, value) in [("memoryUsage", metrics.memory_usage), ("cpuUsage", metrics.cpu_usage)] {
        if value.map_or(false, |v| !v.is_finite() || v < 0.0) {
            return Err(DomainError::validation(field, "must be a non-negative number").into());
        }
    }

    let outcome = state
        .monitors
        .add_performance_data(&id, request.metrics, request.status)
        .await?;
    let message = format!("Performance data recorded, {} alert(s) raised", outcome.alerts.len());
    Ok(Json(ApiResponse::with_message(outcome, message)))
}

/// Performance history of a monitor
#[utoipa::path(
    get,
    path = "/api/v1/process-monitoring/{id}/performance",
    params(("id" = String, Path, description = "Monitor id"), LimitQuery),
    responses(
        (status = 200, description = "Samples, oldest first", body = serde_json::Value),
        (status = 404, description = "Monitor not found")
    )
)]
pub async fn performance_history(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<MonitorId>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> ApiResult<Json<ApiResponse<Vec<PerformanceSample>>>> {
    let samples = state.monitors.performance_history(&id, query.limit).await?;
    Ok(Json(ApiResponse::ok(samples)))
}

/// Raise an alert by hand
#[utoipa::path(
    post,
    path = "/api/v1/process-monitoring/{id}/alerts",
    params(("id" = String, Path, description = "Monitor id")),
    request_body = serde_json::Value,
    responses(
        (status = 201, description = "Alert triggered", body = serde_json::Value),
        (status = 400, description = "Invalid alert"),
        (status = 404, description = "Monitor not found")
    )
)]
pub async fn trigger_alert(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<MonitorId>,
    ApiJson(alert): ApiJson<ManualAlert>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Alert>>)> {
    let alert = state.monitors.trigger_alert(&id, alert).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(alert, "Alert triggered successfully")),
    ))
}

/// Acknowledge an open alert
#[utoipa::path(
    patch,
    path = "/api/v1/process-monitoring/{id}/alerts/{alert_id}/acknowledge",
    params(
        ("id" = String, Path, description = "Monitor id"),
        ("alert_id" = String, Path, description = "Alert id")
    ),
    responses(
        (status = 200, description = "Alert acknowledged", body = serde_json::Value),
        (status = 404, description = "Monitor or active alert not found"),
        (status = 409, description = "Concurrent modification")
    )
)]
pub async fn acknowledge_alert(
    State(state): State<AppState>,
    ApiPath((id, alert_id)): ApiPath<(MonitorId, AlertId)>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<ApiResponse<Alert>>> {
    let alert = state.monitors.acknowledge_alert(&id, &alert_id, &user).await?;
    Ok(Json(ApiResponse::with_message(alert, "Alert acknowledged successfully")))
}

/// Resolve an open alert
#[utoipa::path(
    patch,
    path = "/api/v1/process-monitoring/{id}/alerts/{alert_id}/resolve",
    params(
        ("id" = String, Path, description = "Monitor id"),
        ("alert_id" = String, Path, description = "Alert id")
    ),
    responses(
        (status = 200, description = "Alert resolved", body = serde_json::Value),
        (status = 404, description = "Monitor or active alert not found"),
        (status = 409, description = "Concurrent modification")
    )
)]
pub async fn resolve_alert(
    State(state): State<AppState>,
    ApiPath((id, alert_id)): ApiPath<(MonitorId, AlertId)>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<ApiResponse<Alert>>> {
    let alert = state.monitors.resolve_alert(&id, &alert_id, &user).await?;
    Ok(Json(ApiResponse::with_message(alert, "Alert resolved successfully")))
}

/// Full alert history, newest first
#[utoipa::path(
    get,
    path = "/api/v1/process-monitoring/{id}/alerts/history",
    params(("id" = String, Path, description = "Monitor id"), AlertHistoryQuery),
    responses(
        (status = 200, description = "Alerts, newest first", body = serde_json::Value),
        (status = 404, description = "Monitor not found")
    )
)]
pub async fn alert_history(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<MonitorId>,
    ApiQuery(query): ApiQuery<AlertHistoryQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Alert>>>> {
    let alerts = state.monitors.alert_history(&id, &query.into()).await?;
    Ok(Json(ApiResponse::ok(alerts)))
}

/// Replace SLA targets and recompute compliance
#[utoipa::path(
    patch,
    path = "/api/v1/process-monitoring/{id}/sla",
    params(("id" = String, Path, description = "Monitor id")),
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "SLA targets updated", body = serde_json::Value),
        (status = 400, description = "Invalid targets"),
        (status = 404, description = "Monitor not found")
    )
)]
pub async fn update_sla(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<MonitorId>,
    ApiJson(targets): ApiJson<SlaTargetsPatch>,
) -> ApiResult<Json<ApiResponse<ProcessMonitor>>> {
    let monitor = state.monitors.update_sla(&id, targets).await?;
    Ok(Json(ApiResponse::with_message(monitor, "SLA targets updated successfully")))
}
