//! HTTP API surface for the voice-notes client
//!
//! Each route is a direct event-to-action mapping onto the controller:
//! - GET/POST /notes, GET/PATCH/DELETE /notes/:id - note lifecycle
//! - POST /notes/:id/select - switch the current note
//! - POST /record/toggle, GET /record/status - recording control
//! - GET /notes/:id/export/{markdown,document} - export surfaces
//! - GET/PUT /theme - theme preference
//! - GET /health - health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
