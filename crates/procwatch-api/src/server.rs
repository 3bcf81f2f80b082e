//! HTTP server

use axum::{serve, Router};
use procwatch_config::ServiceConfig;
use tokio::net::TcpListener;

use crate::{routes, state::AppState};

/// Binds the listener and serves the API until shutdown
pub struct ApiServer {
    config: ServiceConfig,
    state: AppState,
}

impl ApiServer {
    pub fn new(config: ServiceConfig) -> Self {
        let state = AppState::new(&config);
        Self { config, state }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn router(&self) -> Router {
        routes::app(self.state.clone())
    }

    /// Serve until ctrl-c
    pub async fn run(self) -> std::io::Result<()> {
        let address = self.config.server.bind_address();
        let listener = TcpListener::bind(&address).await?;
        tracing::info!(address = %address, "procwatch API listening");

        serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Could not install shutdown handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
