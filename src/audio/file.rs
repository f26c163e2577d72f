//! WAV file capture backend
//!
//! Streams samples from a WAV file as if they came from a live device.
//! Frames are delivered as fast as the receiver drains them, with
//! timestamps derived from sample position, so tests and batch runs do
//! not wait out real time.

use super::backend::{AudioBackend, AudioBackendConfig, AudioFrame};
use crate::error::CaptureError;
use hound::WavReader;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

pub struct WavFileBackend {
    path: String,
    config: AudioBackendConfig,
    active: Arc<AtomicBool>,
}

impl WavFileBackend {
    pub fn new(path: impl Into<String>, config: AudioBackendConfig) -> Self {
        Self {
            path: path.into(),
            config,
            active: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait::async_trait]
impl AudioBackend for WavFileBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, CaptureError> {
        let reader = WavReader::open(&self.path)
            .map_err(|e| CaptureError::DeviceNotFound(format!("{}: {}", self.path, e)))?;

        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CaptureError::Stream(format!("failed to read samples: {}", e)))?;

        info!(
            "File backend streaming {}: {}Hz, {}ch, {} samples",
            self.path,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        let samples_per_frame = (spec.sample_rate as u64 * self.config.buffer_duration_ms / 1000)
            .max(1) as usize
            * spec.channels as usize;

        let (tx, rx) = mpsc::channel(100);
        let active = Arc::clone(&self.active);
        active.store(true, Ordering::SeqCst);

        tokio::spawn(async move {
            let mut sent_samples: u64 = 0;
            for chunk in samples.chunks(samples_per_frame) {
                if !active.load(Ordering::SeqCst) {
                    break;
                }

                let timestamp_ms =
                    sent_samples * 1000 / (spec.sample_rate as u64 * spec.channels as u64);
                sent_samples += chunk.len() as u64;

                let frame = AudioFrame {
                    samples: chunk.to_vec(),
                    sample_rate: spec.sample_rate,
                    channels: spec.channels,
                    timestamp_ms,
                };

                if tx.send(frame).await.is_err() {
                    warn!("File backend receiver dropped, stopping stream");
                    break;
                }
            }
            active.store(false, Ordering::SeqCst);
        });

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        self.active.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "wav-file"
    }
}
