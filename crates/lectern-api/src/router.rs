//! Router configuration and server setup.

use axum::{
    routing::{get, post},
    Router,
};
use tracing::info;

use crate::handlers;
use crate::state::AppState;

/// Creates the API router with all routes configured.
pub fn create_router(state: AppState) -> Router {
    let cors = state.config.cors.layer();

    Router::new()
        // Status
        .route("/api/status", get(handlers::status))
        // Classes
        .route("/api/classes/:id/config", get(handlers::get_class_config))
        .route("/api/classes/:id/outline", get(handlers::get_class_outline))
        .route("/api/classes/:id/pauses", get(handlers::get_class_pauses))
        .route("/api/classes/:id/media", get(handlers::get_class_media))
        .route(
            "/api/classes/:id/media/:index",
            post(handlers::show_class_media),
        )
        .route("/api/classes/:id/commands", post(handlers::send_class_command))
        // Channels
        .route("/api/channels/:key/commands", post(handlers::publish_command))
        .layer(cors)
        .with_state(state)
}

/// Starts the API server.
pub async fn serve(state: AppState) -> Result<(), std::io::Error> {
    let addr = state.config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, transport = %state.transport.kind(), "hub listening");
    axum::serve(listener, create_router(state)).await
}

/// Starts the API server and stops when `shutdown` resolves.
pub async fn serve_with_shutdown<F>(state: AppState, shutdown: F) -> Result<(), std::io::Error>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let addr = state.config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, transport = %state.transport.kind(), "hub listening");
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
