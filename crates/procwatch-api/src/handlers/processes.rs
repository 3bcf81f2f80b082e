//! Automated process API handlers

use axum::{extract::State, http::StatusCode, Json};
use procwatch_domain::{AutomatedProcess, ExecutionRecord, NewProcess, ProcessId, ProcessPatch};

use crate::{
    error::ApiResult,
    extract::{ApiJson, ApiPath, ApiQuery, CurrentUser},
    models::{ApiResponse, LimitQuery, ListProcessesQuery},
    state::AppState,
};

/// List automated processes
#[utoipa::path(
    get,
    path = "/api/v1/automated-processes",
    params(ListProcessesQuery),
    responses(
        (status = 200, description = "Processes, newest first", body = serde_json::Value),
        (status = 400, description = "Invalid query")
    )
)]
pub async fn list_processes(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListProcessesQuery>,
) -> ApiResult<Json<ApiResponse<Vec<AutomatedProcess>>>> {
    let processes = state.catalog.list(&query.into()).await?;
    Ok(Json(ApiResponse::ok(processes)))
}

/// Get one process
#[utoipa::path(
    get,
    path = "/api/v1/automated-processes/{id}",
    params(("id" = String, Path, description = "Process id")),
    responses(
        (status = 200, description = "Process", body = serde_json::Value),
        (status = 404, description = "Process not found")
    )
)]
pub async fn get_process(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProcessId>,
) -> ApiResult<Json<ApiResponse<AutomatedProcess>>> {
    let process = state.catalog.get(&id).await?;
    Ok(Json(ApiResponse::ok(process)))
}

/// Create a process
#[utoipa::path(
    post,
    path = "/api/v1/automated-processes",
    request_body = serde_json::Value,
    responses(
        (status = 201, description = "Process created", body = serde_json::Value),
        (status = 400, description = "Invalid process definition")
    )
)]
pub async fn create_process(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(input): ApiJson<NewProcess>,
) -> ApiResult<(StatusCode, Json<ApiResponse<AutomatedProcess>>)> {
    let process = state.catalog.create(input, &user).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(process, "Automated process created successfully")),
    ))
}

/// Update a process
#[utoipa::path(
    put,
    path = "/api/v1/automated-processes/{id}",
    params(("id" = String, Path, description = "Process id")),
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Process updated", body = serde_json::Value),
        (status = 400, description = "Invalid update"),
        (status = 404, description = "Process not found"),
        (status = 409, description = "Concurrent modification")
    )
)]
pub async fn update_process(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProcessId>,
    CurrentUser(user): CurrentUser,
    ApiJson(patch): ApiJson<ProcessPatch>,
) -> ApiResult<Json<ApiResponse<AutomatedProcess>>> {
    let process = state.catalog.update(&id, patch, &user).await?;
    Ok(Json(ApiResponse::with_message(process, "Automated process updated successfully")))
}

/// Soft-delete a process
#[utoipa::path(
    delete,
    path = "/api/v1/automated-processes/{id}",
    params(("id" = String, Path, description = "Process id")),
    responses(
        (status = 200, description = "Process deleted", body = serde_json::Value),
        (status = 404, description = "Process not found")
    )
)]
pub async fn delete_process(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProcessId>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<ApiResponse<AutomatedProcess>>> {
    let process = state.catalog.soft_delete(&id, &user).await?;
    Ok(Json(ApiResponse::with_message(process, "Automated process deleted successfully")))
}

/// Start an execution; completion happens in the background
#[utoipa::path(
    post,
    path = "/api/v1/automated-processes/{id}/execute",
    params(("id" = String, Path, description = "Process id")),
    responses(
        (status = 202, description = "Execution started", body = serde_json::Value),
        (status = 400, description = "Process is not active"),
        (status = 404, description = "Process not found")
    )
)]
pub async fn execute_process(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProcessId>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<(StatusCode, Json<ApiResponse<ExecutionRecord>>)> {
    let execution = state.simulator.start_execution(&id, &user).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::with_message(execution, "Process execution started")),
    ))
}

/// Execution history of a process
#[utoipa::path(
    get,
    path = "/api/v1/automated-processes/{id}/executions",
    params(("id" = String, Path, description = "Process id"), LimitQuery),
    responses(
        (status = 200, description = "Executions, newest first", body = serde_json::Value),
        (status = 404, description = "Process not found")
    )
)]
pub async fn list_executions(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProcessId>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> ApiResult<Json<ApiResponse<Vec<ExecutionRecord>>>> {
    let executions = state.simulator.list_executions(&id, query.limit).await?;
    Ok(Json(ApiResponse::ok(executions)))
}
