//! Class handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use lectern_models::{is_valid_class_id, ClassConfig, Command};
use lectern_presenter::{MediaAction, NO_PAUSES_MESSAGE};
use tracing::info;

use crate::error::{ApiError, Result};
use crate::state::AppState;
use crate::types::{
    MediaActionResponse, MediaListResponse, OutlineQuery, OutlineResponse, PauseListResponse,
    PublishedResponse,
};

pub(crate) fn validate_class_id(id: &str) -> Result<()> {
    if is_valid_class_id(id) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!("invalid class id: {:?}", id)))
    }
}

/// GET /api/classes/:id/config - Resolved class configuration.
pub async fn get_class_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ClassConfig>> {
    validate_class_id(&id)?;
    Ok(Json(state.class(&id)))
}

/// GET /api/classes/:id/outline - Outline sections and their jumps.
pub async fn get_class_outline(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<OutlineQuery>,
) -> Result<Json<OutlineResponse>> {
    validate_class_id(&id)?;
    let mut sections = state.presenter(&id).outline();
    if query.jumpable {
        sections.retain(|section| section.jump.is_some());
    }

    let total = sections.len();
    Ok(Json(OutlineResponse {
        class_id: id,
        sections,
        total,
    }))
}

/// GET /api/classes/:id/pauses - Pause list.
pub async fn get_class_pauses(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PauseListResponse>> {
    validate_class_id(&id)?;
    let pauses = state.presenter(&id).pause_list();
    let total = pauses.len();

    Ok(Json(PauseListResponse {
        class_id: id,
        message: pauses.is_empty().then(|| NO_PAUSES_MESSAGE.to_string()),
        pauses,
        total,
    }))
}

/// GET /api/classes/:id/media - Media gallery.
pub async fn get_class_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MediaListResponse>> {
    validate_class_id(&id)?;
    let media = state.presenter(&id).media();
    let total = media.len();

    Ok(Json(MediaListResponse {
        class_id: id,
        media,
        total,
    }))
}

/// POST /api/classes/:id/media/:index - Show a media entry.
pub async fn show_class_media(
    State(state): State<AppState>,
    Path((id, index)): Path<(String, usize)>,
) -> Result<(StatusCode, Json<MediaActionResponse>)> {
    validate_class_id(&id)?;
    let mut presenter = state.presenter(&id);
    let channel = presenter.class().channel_key.to_string();

    match presenter.show_media(index)? {
        MediaAction::Sent(message) => Ok((
            StatusCode::ACCEPTED,
            Json(MediaActionResponse::Sent { channel, message }),
        )),
        MediaAction::OpenLocally(url) => {
            Ok((StatusCode::OK, Json(MediaActionResponse::OpenLocally { url })))
        }
    }
}

/// POST /api/classes/:id/commands - Send a command to a class's displays.
pub async fn send_class_command(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(command): Json<Command>,
) -> Result<(StatusCode, Json<PublishedResponse>)> {
    validate_class_id(&id)?;
    let mut presenter = state.presenter(&id);
    let message = presenter.send(command);
    info!(class_id = %id, status = presenter.status(), "class command sent");

    Ok((
        StatusCode::ACCEPTED,
        Json(PublishedResponse {
            channel: presenter.class().channel_key.to_string(),
            message,
            status: Some(presenter.status().to_string()),
        }),
    ))
}
