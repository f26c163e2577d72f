use crate::error::CaptureError;
use tokio::sync::mpsc;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Configuration for audio backend
#[derive(Debug, Clone)]
pub struct AudioBackendConfig {
    /// Target sample rate
    pub target_sample_rate: u32,
    /// Target channel count (1 = mono, 2 = stereo)
    pub target_channels: u16,
    /// Buffer size in milliseconds (affects latency)
    pub buffer_duration_ms: u64,
}

impl Default for AudioBackendConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 16000,
            target_channels: 1,
            buffer_duration_ms: 100,
        }
    }
}

/// Audio capture backend trait
///
/// Implementations:
/// - Microphone: cpal input stream (requires the `mic` cargo feature)
/// - File: stream frames from a WAV file (testing/batch processing)
#[async_trait::async_trait]
pub trait AudioBackend: Send + Sync {
    /// Start capturing audio
    ///
    /// Returns a channel receiver that will receive audio frames.
    /// Failure kinds distinguish a denied permission from a missing
    /// device so the caller can report them separately.
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, CaptureError>;

    /// Stop capturing audio
    async fn stop(&mut self) -> Result<(), CaptureError>;

    /// Check if backend is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Audio source type
#[derive(Debug, Clone)]
pub enum AudioSource {
    /// Microphone input
    Microphone,
    /// File input (for testing/batch processing)
    File(String),
}

/// Audio backend factory
pub struct AudioBackendFactory;

impl AudioBackendFactory {
    /// Create an audio backend for the given source.
    pub fn create(
        source: AudioSource,
        config: AudioBackendConfig,
    ) -> Result<Box<dyn AudioBackend>, CaptureError> {
        match source {
            AudioSource::Microphone => {
                #[cfg(feature = "mic")]
                {
                    use super::mic::MicrophoneBackend;
                    Ok(Box::new(MicrophoneBackend::new(config)))
                }

                #[cfg(not(feature = "mic"))]
                {
                    let _ = config;
                    Err(CaptureError::DeviceNotFound(
                        "microphone capture requires the `mic` feature".to_string(),
                    ))
                }
            }

            AudioSource::File(path) => {
                use super::file::WavFileBackend;
                Ok(Box::new(WavFileBackend::new(path, config)))
            }
        }
    }
}
