//! HTTP Server configuration and startup.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use refdata_types::{ReferenceRepository, ReferenceSource};

use super::handlers::{self, AppState};
use crate::{RateService, SyncService};

/// HTTP Server for the reference data API.
pub struct HttpServer<R: ReferenceRepository, S: ReferenceSource + 'static> {
    state: Arc<AppState<R, S>>,
}

impl<R: ReferenceRepository, S: ReferenceSource + 'static> HttpServer<R, S> {
    /// Creates a new HTTP server with the given services.
    pub fn new(sync: SyncService<R, S>, rates: RateService<R>) -> Self {
        Self {
            state: Arc::new(AppState { sync, rates }),
        }
    }

    /// Builds the Axum router with all routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/api/currencies", get(handlers::list_currencies::<R, S>))
            .route("/api/rates/latest", get(handlers::latest_rate::<R, S>))
            .route("/api/rates/range", get(handlers::rate_range::<R, S>))
            .route(
                "/api/sync/currencies",
                post(handlers::sync_currencies::<R, S>),
            )
            .route("/api/sync/rates", post(handlers::sync_rates::<R, S>))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Runs the server on the given address with graceful shutdown.
    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
