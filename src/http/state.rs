use crate::controller::NoteController;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The single note session controller
    pub controller: Arc<NoteController>,
}

impl AppState {
    pub fn new(controller: NoteController) -> Self {
        Self {
            controller: Arc::new(controller),
        }
    }
}
