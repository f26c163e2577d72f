//! Microphone capture backend (cpal)
//!
//! cpal streams are not Send, so the stream lives on a dedicated OS
//! thread for the lifetime of the capture. Frames are pushed into a
//! tokio channel from the device callback; the session downsamples and
//! downmixes to the target format.

use super::backend::{AudioBackend, AudioBackendConfig, AudioFrame};
use crate::error::CaptureError;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

pub struct MicrophoneBackend {
    config: AudioBackendConfig,
    active: Arc<AtomicBool>,
}

impl MicrophoneBackend {
    pub fn new(config: AudioBackendConfig) -> Self {
        Self {
            config,
            active: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait::async_trait]
impl AudioBackend for MicrophoneBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, CaptureError> {
        let (ready_tx, ready_rx) = oneshot::channel();
        let (frame_tx, frame_rx) = mpsc::channel(100);

        self.active.store(true, Ordering::SeqCst);
        let active = Arc::clone(&self.active);
        let config = self.config.clone();

        std::thread::spawn(move || capture_thread(config, active, ready_tx, frame_tx));

        match ready_rx.await {
            Ok(Ok(())) => Ok(frame_rx),
            Ok(Err(e)) => {
                self.active.store(false, Ordering::SeqCst);
                Err(e)
            }
            Err(_) => {
                self.active.store(false, Ordering::SeqCst);
                Err(CaptureError::Stream(
                    "capture thread exited before starting".to_string(),
                ))
            }
        }
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        self.active.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "microphone"
    }
}

/// Classify a device-acquisition failure by its message. Platform APIs
/// surface denied permission as an error string rather than a distinct
/// type.
fn classify_device_error(msg: String) -> CaptureError {
    let lower = msg.to_lowercase();
    if lower.contains("denied") || lower.contains("permission") {
        CaptureError::PermissionDenied(msg)
    } else {
        CaptureError::DeviceNotFound(msg)
    }
}

fn capture_thread(
    _config: AudioBackendConfig,
    active: Arc<AtomicBool>,
    ready_tx: oneshot::Sender<Result<(), CaptureError>>,
    frame_tx: mpsc::Sender<AudioFrame>,
) {
    let host = cpal::default_host();

    let device = match host.default_input_device() {
        Some(d) => d,
        None => {
            let _ = ready_tx.send(Err(CaptureError::DeviceNotFound(
                "no default input device".to_string(),
            )));
            return;
        }
    };

    let supported = match device.default_input_config() {
        Ok(c) => c,
        Err(e) => {
            let _ = ready_tx.send(Err(classify_device_error(e.to_string())));
            return;
        }
    };

    let sample_rate = supported.sample_rate().0;
    let channels = supported.channels();
    let sample_format = supported.sample_format();
    let stream_config: cpal::StreamConfig = supported.into();

    info!(
        "Microphone capture: {}Hz, {}ch, {:?}",
        sample_rate, channels, sample_format
    );

    // Sample counter shared with the callback for frame timestamps
    let sent_samples = Arc::new(AtomicU64::new(0));

    let err_fn = |e: cpal::StreamError| error!("Audio stream error: {}", e);

    let build = |frame_tx: mpsc::Sender<AudioFrame>| {
        let sent_samples = Arc::clone(&sent_samples);
        move |samples: Vec<i16>| {
            let count = samples.len() as u64;
            let sent = sent_samples.fetch_add(count, Ordering::SeqCst);
            let timestamp_ms = sent * 1000 / (sample_rate as u64 * channels as u64);

            let frame = AudioFrame {
                samples,
                sample_rate,
                channels,
                timestamp_ms,
            };

            // Never block the device callback; a full channel drops the frame
            if frame_tx.try_send(frame).is_err() {
                warn!("Capture channel full, dropping frame");
            }
        }
    };

    let stream = match sample_format {
        cpal::SampleFormat::I16 => {
            let push = build(frame_tx);
            device.build_input_stream(
                &stream_config,
                move |data: &[i16], _| push(data.to_vec()),
                err_fn,
                None,
            )
        }
        cpal::SampleFormat::U16 => {
            let push = build(frame_tx);
            device.build_input_stream(
                &stream_config,
                move |data: &[u16], _| {
                    push(data.iter().map(|&s| (s as i32 - 32768) as i16).collect())
                },
                err_fn,
                None,
            )
        }
        _ => {
            let push = build(frame_tx);
            device.build_input_stream(
                &stream_config,
                move |data: &[f32], _| {
                    push(
                        data.iter()
                            .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                            .collect(),
                    )
                },
                err_fn,
                None,
            )
        }
    };

    let stream = match stream {
        Ok(s) => s,
        Err(e) => {
            let _ = ready_tx.send(Err(classify_device_error(e.to_string())));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(CaptureError::Stream(e.to_string())));
        return;
    }

    let _ = ready_tx.send(Ok(()));

    // Hold the stream open until the session releases the handle
    while active.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(50));
    }

    drop(stream);
    info!("Microphone capture stopped");
}
