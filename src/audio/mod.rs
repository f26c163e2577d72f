pub mod backend;
pub mod file;
pub mod waveform;

#[cfg(feature = "mic")]
pub mod mic;

pub use backend::{
    AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFrame, AudioSource,
};
pub use file::WavFileBackend;
pub use waveform::{WaveformBuffer, BAR_COUNT};
