use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Note list and lifecycle
        .route(
            "/notes",
            get(handlers::list_notes).post(handlers::create_note),
        )
        .route("/notes/current", get(handlers::current_note))
        .route(
            "/notes/:id",
            get(handlers::get_note)
                .patch(handlers::edit_note)
                .delete(handlers::delete_note),
        )
        .route("/notes/:id/select", post(handlers::select_note))
        // Recording control
        .route("/record/toggle", post(handlers::toggle_recording))
        .route("/record/status", get(handlers::record_status))
        // Export surfaces
        .route("/notes/:id/export/markdown", get(handlers::export_markdown))
        .route("/notes/:id/export/document", get(handlers::export_document))
        // Theme preference
        .route("/theme", get(handlers::get_theme).put(handlers::set_theme))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
