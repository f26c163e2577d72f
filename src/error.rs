use thiserror::Error;

/// Failures produced by the recording lifecycle.
///
/// Every variant is caught at the controller boundary and converted to a
/// status message; none of these crash the session.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Microphone permission denied: {0}")]
    PermissionDenied(String),

    #[error("No audio capture device found: {0}")]
    DeviceNotFound(String),

    #[error("No audio was captured. Please try again.")]
    EmptyCapture,

    #[error("Audio stream failed: {0}")]
    Stream(String),
}

/// Failures produced by the transcription/polish pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to encode audio payload: {0}")]
    Encoding(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Polishing failed: {0}")]
    Polish(String),
}
