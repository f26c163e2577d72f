//! Recording session management
//!
//! This module provides the `RecordingSession` abstraction that manages:
//! - Audio capture from the configured backend
//! - Audio processing (downsampling, mono conversion)
//! - Live waveform magnitudes and elapsed-time display
//! - Deterministic teardown of all periodic tasks on stop

mod config;
mod session;
mod state;

pub use config::SessionConfig;
pub use session::{RecordedClip, RecordingSession};
pub use state::RecordingState;
