//! Status handler.

use axum::{extract::State, Json};

use crate::state::AppState;
use crate::types::StatusResponse;

/// GET /api/status - Hub status.
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.config.uptime_seconds(),
        transport: state.transport.kind().to_string(),
    })
}
