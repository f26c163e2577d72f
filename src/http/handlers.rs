use super::state::AppState;
use crate::controller::{ControllerStatus, NoteEdit};
use crate::export;
use crate::store::Note;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::error;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteNoteResponse {
    pub deleted: String,
    /// The note that became current after the delete
    pub current: Note,
}

#[derive(Debug, Deserialize)]
pub struct ThemeRequest {
    /// "light", or null meaning dark
    pub theme: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ThemeResponse {
    pub theme: Option<String>,
}

fn not_found(id: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Note {} not found", id),
        }),
    )
}

fn internal(e: anyhow::Error) -> (StatusCode, Json<ErrorResponse>) {
    error!("Request failed: {:#}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: format!("{}", e),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /notes
pub async fn list_notes(State(state): State<AppState>) -> impl IntoResponse {
    let notes = state.controller.list_notes().await;
    (StatusCode::OK, Json(notes))
}

/// POST /notes — create a fresh blank note and make it current
pub async fn create_note(State(state): State<AppState>) -> impl IntoResponse {
    match state.controller.create_note().await {
        Ok(note) => (StatusCode::CREATED, Json(note)).into_response(),
        Err(e) => internal(e).into_response(),
    }
}

/// GET /notes/:id
pub async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.controller.get_note(&id).await {
        Some(note) => (StatusCode::OK, Json(note)).into_response(),
        None => not_found(&id).into_response(),
    }
}

/// PATCH /notes/:id — apply an edit; the save is debounced
pub async fn edit_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(edit): Json<NoteEdit>,
) -> impl IntoResponse {
    match state.controller.edit_note(&id, edit).await {
        Some(note) => (StatusCode::OK, Json(note)).into_response(),
        None => not_found(&id).into_response(),
    }
}

/// DELETE /notes/:id — the store is never left empty
pub async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.controller.delete_note(&id).await {
        Ok(true) => {
            let current = state.controller.current_note().await;
            (
                StatusCode::OK,
                Json(DeleteNoteResponse {
                    deleted: id,
                    current,
                }),
            )
                .into_response()
        }
        Ok(false) => not_found(&id).into_response(),
        Err(e) => internal(e).into_response(),
    }
}

/// POST /notes/:id/select — make a note current (stops any active
/// recording first)
pub async fn select_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.controller.select_note(&id).await {
        Some(note) => (StatusCode::OK, Json(note)).into_response(),
        None => not_found(&id).into_response(),
    }
}

/// GET /notes/current
pub async fn current_note(State(state): State<AppState>) -> impl IntoResponse {
    let note = state.controller.current_note().await;
    (StatusCode::OK, Json(note))
}

/// POST /record/toggle — start when idle, stop-and-transcribe when
/// active. Failures come back as status text, not HTTP errors.
pub async fn toggle_recording(State(state): State<AppState>) -> Json<ControllerStatus> {
    Json(state.controller.toggle_recording().await)
}

/// GET /record/status — state, elapsed display, waveform bars
pub async fn record_status(State(state): State<AppState>) -> Json<ControllerStatus> {
    Json(state.controller.status().await)
}

/// GET /notes/:id/export/markdown — file download of the polished
/// content, filename derived from the title
pub async fn export_markdown(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let Some(note) = state.controller.get_note(&id).await else {
        return not_found(&id).into_response();
    };

    let filename = export::markdown_filename(&note.title);
    let body = export::markdown_body(&note);

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

/// GET /notes/:id/export/document — styled print-ready document
pub async fn export_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.controller.get_note(&id).await {
        Some(note) => Html(export::printable_document(&note)).into_response(),
        None => not_found(&id).into_response(),
    }
}

/// GET /theme
pub async fn get_theme(State(state): State<AppState>) -> Json<ThemeResponse> {
    Json(ThemeResponse {
        theme: state.controller.theme().await,
    })
}

/// PUT /theme
pub async fn set_theme(
    State(state): State<AppState>,
    Json(req): Json<ThemeRequest>,
) -> impl IntoResponse {
    match state.controller.set_theme(req.theme.as_deref()).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ThemeResponse { theme: req.theme }),
        )
            .into_response(),
        Err(e) => internal(e).into_response(),
    }
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
