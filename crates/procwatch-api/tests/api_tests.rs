use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use procwatch_api::{app, AppState};
use procwatch_config::ServiceConfig;
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_app() -> Router {
    let mut config = ServiceConfig::default();
    config.execution.completion_delay_ms = 20;
    app(AppState::new(&config))
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", "steward-7")
        .header("x-user-email", "steward7@example.com");
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_process(app: &Router, status: &str) -> String {
    let (code, body) = call(
        app,
        Method::POST,
        "/api/v1/automated-processes",
        Some(json!({
            "name": "Vendor risk review",
            "category": "third-party",
            "status": status,
            "steps": [{ "stepId": "s1", "name": "Collect" }, { "stepId": "s2", "name": "Approve" }]
        })),
    )
    .await;
    assert_eq!(code, StatusCode::CREATED);
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn create_monitor(app: &Router, process_id: &str) -> String {
    let (code, body) = call(
        app,
        Method::POST,
        "/api/v1/process-monitoring",
        Some(json!({ "processId": process_id })),
    )
    .await;
    assert_eq!(code, StatusCode::CREATED);
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let (code, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_create_process_assigns_step_order_and_creator() {
    let app = test_app();
    let id = create_process(&app, "Active").await;

    let (code, body) = call(&app, Method::GET, &format!("/api/v1/automated-processes/{}", id), None).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["steps"][0]["order"], 1);
    assert_eq!(body["data"]["steps"][1]["order"], 2);
    assert_eq!(body["data"]["createdBy"], "steward-7");
}

#[tokio::test]
async fn test_invalid_process_is_400_with_envelope() {
    let app = test_app();
    let (code, body) = call(
        &app,
        Method::POST,
        "/api/v1/automated-processes",
        Some(json!({ "name": "  ", "category": "x" })),
    )
    .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["type"], "validation_error");
}

#[tokio::test]
async fn test_malformed_id_is_400() {
    let app = test_app();
    let (code, body) = call(&app, Method::GET, "/api/v1/automated-processes/not-a-uuid", None).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_execute_returns_running_then_completes() {
    let app = test_app();
    let id = create_process(&app, "Active").await;

    let (code, body) = call(
        &app,
        Method::POST,
        &format!("/api/v1/automated-processes/{}/execute", id),
        None,
    )
    .await;
    assert_eq!(code, StatusCode::ACCEPTED);
    assert_eq!(body["data"]["status"], "Running");

    let mut status = Value::Null;
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let (_, runs) = call(
            &app,
            Method::GET,
            &format!("/api/v1/automated-processes/{}/executions", id),
            None,
        )
        .await;
        status = runs["data"][0]["status"].clone();
        if status == "Completed" {
            break;
        }
    }
    assert_eq!(status, "Completed");
}

#[tokio::test]
async fn test_execute_inactive_process_is_400() {
    let app = test_app();
    let id = create_process(&app, "Inactive").await;

    let (code, body) = call(
        &app,
        Method::POST,
        &format!("/api/v1/automated-processes/{}/execute", id),
        None,
    )
    .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "invalid_state");

    let (_, runs) = call(
        &app,
        Method::GET,
        &format!("/api/v1/automated-processes/{}/executions", id),
        None,
    )
    .await;
    assert_eq!(runs["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_duplicate_monitor_is_400_conflict() {
    let app = test_app();
    let process_id = create_process(&app, "Active").await;
    create_monitor(&app, &process_id).await;

    let (code, body) = call(
        &app,
        Method::POST,
        "/api/v1/process-monitoring",
        Some(json!({ "processId": process_id })),
    )
    .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "conflict");
}

#[tokio::test]
async fn test_monitor_for_unknown_process_is_404() {
    let app = test_app();
    let (code, _) = call(
        &app,
        Method::POST,
        "/api/v1/process-monitoring",
        Some(json!({ "processId": "6f1c2b7e-8a43-4f7c-9d35-2f0f6f0f1a11" })),
    )
    .await;
    assert_eq!(code, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_performance_breach_then_alert_lifecycle() {
    let app = test_app();
    let process_id = create_process(&app, "Active").await;
    let monitor_id = create_monitor(&app, &process_id).await;

    let (code, body) = call(
        &app,
        Method::POST,
        &format!("/api/v1/process-monitoring/{}/performance", monitor_id),
        Some(json!({ "executionTime": 301000 })),
    )
    .await;
    assert_eq!(code, StatusCode::OK);
    let alerts = body["data"]["alerts"].as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["alertType"], "Execution_Timeout");
    assert_eq!(alerts[0]["severity"], "High");
    let alert_id = alerts[0]["alertId"].as_str().unwrap().to_string();

    let (code, body) = call(
        &app,
        Method::PATCH,
        &format!("/api/v1/process-monitoring/{}/alerts/{}/acknowledge", monitor_id, alert_id),
        None,
    )
    .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["data"]["acknowledgedBy"], "steward-7");

    let (code, _) = call(
        &app,
        Method::PATCH,
        &format!("/api/v1/process-monitoring/{}/alerts/{}/resolve", monitor_id, alert_id),
        None,
    )
    .await;
    assert_eq!(code, StatusCode::OK);

    let (_, view) = call(&app, Method::GET, &format!("/api/v1/process-monitoring/{}", monitor_id), None).await;
    assert_eq!(view["data"]["activeAlerts"].as_array().unwrap().len(), 0);

    let (_, history) = call(
        &app,
        Method::GET,
        &format!("/api/v1/process-monitoring/{}/alerts/history?resolved=true", monitor_id),
        None,
    )
    .await;
    assert_eq!(history["data"].as_array().unwrap().len(), 1);

    let (code, body) = call(
        &app,
        Method::PATCH,
        &format!("/api/v1/process-monitoring/{}/alerts/{}/resolve", monitor_id, alert_id),
        None,
    )
    .await;
    assert_eq!(code, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["type"], "not_found");
}

#[tokio::test]
async fn test_empty_performance_sample_is_400() {
    let app = test_app();
    let process_id = create_process(&app, "Active").await;
    let monitor_id = create_monitor(&app, &process_id).await;

    let (code, _) = call(
        &app,
        Method::POST,
        &format!("/api/v1/process-monitoring/{}/performance", monitor_id),
        Some(json!({})),
    )
    .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_manual_alert_and_sla_update() {
    let app = test_app();
    let process_id = create_process(&app, "Active").await;
    let monitor_id = create_monitor(&app, &process_id).await;

    let (code, body) = call(
        &app,
        Method::POST,
        &format!("/api/v1/process-monitoring/{}/alerts", monitor_id),
        Some(json!({ "severity": "Low", "message": "Evidence overdue" })),
    )
    .await;
    assert_eq!(code, StatusCode::CREATED);
    assert_eq!(body["data"]["alertType"], "Manual");

    let (code, body) = call(
        &app,
        Method::PATCH,
        &format!("/api/v1/process-monitoring/{}/sla", monitor_id),
        Some(json!({ "availability": 95.0 })),
    )
    .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["data"]["slaTargets"]["availability"], 95.0);

    let (code, _) = call(
        &app,
        Method::PATCH,
        &format!("/api/v1/process-monitoring/{}/sla", monitor_id),
        Some(json!({ "availability": 150.0 })),
    )
    .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_dashboard_timeframes() {
    let app = test_app();
    let process_id = create_process(&app, "Active").await;
    create_monitor(&app, &process_id).await;

    let (code, body) = call(&app, Method::GET, "/api/v1/process-monitoring/analytics/dashboard", None).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["data"]["timeframe"], "24h");
    assert_eq!(body["data"]["totalMonitors"], 1);
    assert_eq!(body["data"]["monitorsByStatus"]["Healthy"], 1);

    let (code, _) = call(
        &app,
        Method::GET,
        "/api/v1/process-monitoring/analytics/dashboard?timeframe=7d",
        None,
    )
    .await;
    assert_eq!(code, StatusCode::OK);

    let (code, body) = call(
        &app,
        Method::GET,
        "/api/v1/process-monitoring/analytics/dashboard?timeframe=2y",
        None,
    )
    .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "validation_error");
}

#[tokio::test]
async fn test_finished_execution_feeds_the_monitor() {
    let app = test_app();
    let process_id = create_process(&app, "Active").await;
    let monitor_id = create_monitor(&app, &process_id).await;

    call(
        &app,
        Method::POST,
        &format!("/api/v1/automated-processes/{}/execute", process_id),
        None,
    )
    .await;

    let mut samples = 0;
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let (_, body) = call(
            &app,
            Method::GET,
            &format!("/api/v1/process-monitoring/{}/performance", monitor_id),
            None,
        )
        .await;
        samples = body["data"].as_array().map_or(0, |a| a.len());
        if samples > 0 {
            break;
        }
    }
    assert_eq!(samples, 1);
}

#[tokio::test]
async fn test_deleted_monitor_is_404() {
    let app = test_app();
    let process_id = create_process(&app, "Active").await;
    let monitor_id = create_monitor(&app, &process_id).await;

    let (code, body) = call(&app, Method::DELETE, &format!("/api/v1/process-monitoring/{}", monitor_id), None).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["data"]["isActive"], false);

    let (code, _) = call(&app, Method::GET, &format!("/api/v1/process-monitoring/{}", monitor_id), None).await;
    assert_eq!(code, StatusCode::NOT_FOUND);
}
