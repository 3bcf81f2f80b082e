//! API route definitions

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    handlers::{health, monitoring, processes},
    middleware::logging_middleware,
    state::AppState,
};

/// API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Automated processes
        .route(
            "/api/v1/automated-processes",
            get(processes::list_processes).post(processes::create_process),
        )
        .route(
            "/api/v1/automated-processes/:id",
            get(processes::get_process)
                .put(processes::update_process)
                .delete(processes::delete_process),
        )
        .route(
            "/api/v1/automated-processes/:id/execute",
            post(processes::execute_process),
        )
        .route(
            "/api/v1/automated-processes/:id/executions",
            get(processes::list_executions),
        )
        // Process monitoring
        .route(
            "/api/v1/process-monitoring",
            get(monitoring::list_monitors).post(monitoring::create_monitor),
        )
        .route(
            "/api/v1/process-monitoring/analytics/dashboard",
            get(monitoring::dashboard),
        )
        .route(
            "/api/v1/process-monitoring/:id",
            get(monitoring::get_monitor)
                .put(monitoring::update_monitor)
                .delete(monitoring::delete_monitor),
        )
        .route(
            "/api/v1/process-monitoring/:id/performance",
            get(monitoring::performance_history).post(monitoring::add_performance_data),
        )
        .route(
            "/api/v1/process-monitoring/:id/alerts",
            post(monitoring::trigger_alert),
        )
        .route(
            "/api/v1/process-monitoring/:id/alerts/history",
            get(monitoring::alert_history),
        )
        .route(
            "/api/v1/process-monitoring/:id/alerts/:alert_id/acknowledge",
            patch(monitoring::acknowledge_alert),
        )
        .route(
            "/api/v1/process-monitoring/:id/alerts/:alert_id/resolve",
            patch(monitoring::resolve_alert),
        )
        .route("/api/v1/process-monitoring/:id/sla", patch(monitoring::update_sla))
}

/// Swagger UI routes
pub fn swagger_routes() -> Router<AppState> {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

/// Combined routes with middleware and state applied
pub fn app(state: AppState) -> Router {
    api_routes()
        .merge(swagger_routes())
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        processes::list_processes,
        processes::get_process,
        processes::create_process,
        processes::update_process,
        processes::delete_process,
        processes::execute_process,
        processes::list_executions,
        monitoring::list_monitors,
        monitoring::get_monitor,
        monitoring::create_monitor,
        monitoring::update_monitor,
        monitoring::delete_monitor,
        monitoring::dashboard,
        monitoring::add_performance_data,
        monitoring::performance_history,
        monitoring::trigger_alert,
        monitoring::acknowledge_alert,
        monitoring::resolve_alert,
        monitoring::alert_history,
        monitoring::update_sla,
    ),
    components(schemas(crate::models::HealthResponse)),
    info(
        title = "procwatch API",
        version = "0.1.0",
        description = "Automated governance processes, simulated executions and process monitoring"
    )
)]
pub struct ApiDoc;
