//! procwatch HTTP API
//!
//! Axum routes for automated processes and their monitors under `/api/v1`,
//! with an OpenAPI document served at `/swagger-ui`.

pub mod error;
pub mod extract;
pub mod feed;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use routes::app;
pub use server::ApiServer;
pub use state::AppState;
