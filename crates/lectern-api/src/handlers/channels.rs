//! Channel handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use lectern_models::{ChannelKey, Command, CommandMessage};
use tracing::debug;

use crate::error::{ApiError, Result};
use crate::state::AppState;
use crate::types::PublishedResponse;

/// POST /api/channels/:key/commands - Publish a command on a channel.
///
/// Delivery is best-effort; the response only confirms the publish.
pub async fn publish_command(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(command): Json<Command>,
) -> Result<(StatusCode, Json<PublishedResponse>)> {
    if key.trim().is_empty() {
        return Err(ApiError::BadRequest("empty channel key".to_string()));
    }

    let channel = ChannelKey::new(key);
    let message = CommandMessage::now(command);
    state.transport.publish(&channel, &message);
    debug!(channel = %channel, command = message.command.name(), "published via api");

    Ok((
        StatusCode::ACCEPTED,
        Json(PublishedResponse {
            channel: channel.to_string(),
            message,
            status: None,
        }),
    ))
}
