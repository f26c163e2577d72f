pub mod audio;
pub mod autosave;
pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod http;
pub mod pipeline;
pub mod session;
pub mod store;

pub use audio::{
    AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFrame, AudioSource,
    WaveformBuffer, BAR_COUNT,
};
pub use config::Config;
pub use controller::{ControllerStatus, NoteController, NoteEdit};
pub use error::{CaptureError, PipelineError};
pub use http::{create_router, AppState};
pub use pipeline::{GeminiClient, SpeechService, TranscriptionPipeline};
pub use session::{RecordedClip, RecordingSession, RecordingState, SessionConfig};
pub use store::{Note, NoteStore};
