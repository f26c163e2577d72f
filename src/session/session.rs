use super::config::SessionConfig;
use crate::audio::{AudioBackend, AudioFrame, WaveformBuffer, BAR_COUNT};
use crate::error::CaptureError;
use anyhow::Result;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{error, info, warn};

/// The buffered audio of a finished recording, encoded as a single WAV
/// blob ready for the transcription pipeline.
#[derive(Debug, Clone)]
pub struct RecordedClip {
    pub wav_bytes: Vec<u8>,
    pub duration_ms: u64,
    pub sample_rate: u32,
    pub channels: u16,
}

impl RecordedClip {
    pub fn mime_type(&self) -> &'static str {
        "audio/wav"
    }
}

/// A single audio-capture lifecycle: buffers chunks from the backend,
/// keeps a live waveform and elapsed-time display, and flushes the
/// buffered audio as one blob on stop.
///
/// All three periodic tasks are joined on every exit path, so no timer
/// or device handle outlives the session.
pub struct RecordingSession {
    config: SessionConfig,
    backend: Box<dyn AudioBackend>,
    started_at: Instant,

    active: Arc<AtomicBool>,
    samples: Arc<Mutex<Vec<i16>>>,
    waveform: Arc<Mutex<WaveformBuffer>>,
    elapsed_display: Arc<Mutex<String>>,

    capture_task: Option<JoinHandle<()>>,
    waveform_task: Option<JoinHandle<()>>,
    timer_task: Option<JoinHandle<()>>,
}

impl RecordingSession {
    pub fn new(backend: Box<dyn AudioBackend>, config: SessionConfig) -> Self {
        Self {
            config,
            backend,
            started_at: Instant::now(),
            active: Arc::new(AtomicBool::new(false)),
            samples: Arc::new(Mutex::new(Vec::new())),
            waveform: Arc::new(Mutex::new(WaveformBuffer::new())),
            elapsed_display: Arc::new(Mutex::new(format_elapsed(Duration::ZERO))),
            capture_task: None,
            waveform_task: None,
            timer_task: None,
        }
    }

    /// Open the capture handle and start buffering chunks plus the two
    /// periodic display tasks.
    ///
    /// A backend failure is returned as its `CaptureError` kind with
    /// nothing left running.
    pub async fn start(&mut self) -> Result<(), CaptureError> {
        let mut audio_rx = self.backend.start().await?;

        self.active.store(true, Ordering::SeqCst);
        self.started_at = Instant::now();

        info!("Recording session started ({})", self.backend.name());

        // Capture task: convert each frame to the target format and
        // append to the session buffer and the waveform window.
        let active = Arc::clone(&self.active);
        let samples = Arc::clone(&self.samples);
        let waveform = Arc::clone(&self.waveform);
        let sample_rate = self.config.sample_rate;
        let channels = self.config.channels;

        self.capture_task = Some(tokio::spawn(async move {
            while let Some(frame) = audio_rx.recv().await {
                if !active.load(Ordering::SeqCst) {
                    break;
                }

                let processed = process_frame(frame, sample_rate, channels);

                if let Ok(mut buf) = samples.lock() {
                    buf.extend_from_slice(&processed.samples);
                }
                if let Ok(mut wf) = waveform.lock() {
                    wf.push_samples(&processed.samples);
                }
            }
        }));

        // Waveform task: one recomputation per display frame.
        let active = Arc::clone(&self.active);
        let waveform = Arc::clone(&self.waveform);
        let mut wf_tick = interval(Duration::from_millis(self.config.waveform_interval_ms));

        self.waveform_task = Some(tokio::spawn(async move {
            loop {
                wf_tick.tick().await;
                if !active.load(Ordering::SeqCst) {
                    break;
                }
                if let Ok(mut wf) = waveform.lock() {
                    wf.tick();
                }
            }
        }));

        // Timer task: fixed-interval elapsed display, mm:ss.hh.
        let active = Arc::clone(&self.active);
        let elapsed_display = Arc::clone(&self.elapsed_display);
        let started_at = self.started_at;
        let mut timer_tick = interval(Duration::from_millis(self.config.timer_interval_ms));

        self.timer_task = Some(tokio::spawn(async move {
            loop {
                timer_tick.tick().await;
                if !active.load(Ordering::SeqCst) {
                    break;
                }
                if let Ok(mut display) = elapsed_display.lock() {
                    *display = format_elapsed(started_at.elapsed());
                }
            }
        }));

        Ok(())
    }

    /// Finalize the capture: release the device handle, join every
    /// periodic task, and flush the buffer as a single WAV blob.
    ///
    /// Returns `EmptyCapture` when nothing was buffered; the pipeline
    /// must not be invoked in that case.
    pub async fn stop(mut self) -> Result<RecordedClip, CaptureError> {
        info!("Stopping recording session");

        self.active.store(false, Ordering::SeqCst);

        if let Err(e) = self.backend.stop().await {
            // Teardown continues; the buffered audio is still usable
            warn!("Audio backend stop failed: {}", e);
        }

        for task in [
            self.capture_task.take(),
            self.waveform_task.take(),
            self.timer_task.take(),
        ]
        .into_iter()
        .flatten()
        {
            if let Err(e) = task.await {
                error!("Session task panicked: {}", e);
            }
        }

        let samples = self
            .samples
            .lock()
            .map(|buf| buf.clone())
            .unwrap_or_default();

        if samples.is_empty() {
            return Err(CaptureError::EmptyCapture);
        }

        let duration_ms = samples.len() as u64 * 1000
            / (self.config.sample_rate as u64 * self.config.channels as u64);

        let wav_bytes = encode_wav(&samples, self.config.sample_rate, self.config.channels)?;

        info!(
            "Recording complete: {:.1}s, {} bytes",
            duration_ms as f64 / 1000.0,
            wav_bytes.len()
        );

        Ok(RecordedClip {
            wav_bytes,
            duration_ms,
            sample_rate: self.config.sample_rate,
            channels: self.config.channels,
        })
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn elapsed_display(&self) -> String {
        self.elapsed_display
            .lock()
            .map(|d| d.clone())
            .unwrap_or_else(|_| format_elapsed(Duration::ZERO))
    }

    /// Elapsed display shown while no session is running.
    pub fn idle_elapsed() -> String {
        format_elapsed(Duration::ZERO)
    }

    pub fn waveform_bars(&self) -> [f32; BAR_COUNT] {
        self.waveform
            .lock()
            .map(|wf| wf.bars())
            .unwrap_or([0.0; BAR_COUNT])
    }
}

/// Process audio frame: downsample and convert to target format
fn process_frame(frame: AudioFrame, target_sample_rate: u32, target_channels: u16) -> AudioFrame {
    let mut processed = frame;

    if processed.sample_rate != target_sample_rate {
        processed = downsample_frame(processed, target_sample_rate);
    }

    if processed.channels != target_channels && target_channels == 1 {
        processed = stereo_to_mono(processed);
    }

    processed
}

/// Downsample audio frame by decimation
fn downsample_frame(frame: AudioFrame, target_rate: u32) -> AudioFrame {
    if frame.sample_rate == target_rate {
        return frame;
    }

    let ratio = frame.sample_rate / target_rate;
    if ratio <= 1 {
        return frame; // Can't upsample
    }

    let downsampled: Vec<i16> = frame
        .samples
        .iter()
        .step_by(ratio as usize)
        .copied()
        .collect();

    AudioFrame {
        samples: downsampled,
        sample_rate: target_rate,
        channels: frame.channels,
        timestamp_ms: frame.timestamp_ms,
    }
}

/// Convert stereo to mono by summing channels
fn stereo_to_mono(frame: AudioFrame) -> AudioFrame {
    if frame.channels != 2 {
        return frame; // Only support stereo -> mono
    }

    let mut mono_samples = Vec::with_capacity(frame.samples.len() / 2);

    for chunk in frame.samples.chunks_exact(2) {
        let sum = chunk[0] as i32 + chunk[1] as i32;
        mono_samples.push(sum.clamp(i16::MIN as i32, i16::MAX as i32) as i16);
    }

    AudioFrame {
        samples: mono_samples,
        sample_rate: frame.sample_rate,
        channels: 1,
        timestamp_ms: frame.timestamp_ms,
    }
}

/// Encode PCM samples as an in-memory WAV blob.
fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Result<Vec<u8>, CaptureError> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut bytes = Vec::new();
    {
        let cursor = Cursor::new(&mut bytes);
        let mut writer = hound::WavWriter::new(cursor, spec)
            .map_err(|e| CaptureError::Stream(format!("WAV encode failed: {}", e)))?;

        for &sample in samples {
            writer
                .write_sample(sample)
                .map_err(|e| CaptureError::Stream(format!("WAV encode failed: {}", e)))?;
        }

        writer
            .finalize()
            .map_err(|e| CaptureError::Stream(format!("WAV encode failed: {}", e)))?;
    }

    Ok(bytes)
}

/// Format an elapsed duration as `mm:ss.hh` (minutes, seconds,
/// hundredths).
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_ms = elapsed.as_millis();
    let minutes = total_ms / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let hundredths = (total_ms % 1000) / 10;
    format!("{:02}:{:02}.{:02}", minutes, seconds, hundredths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_formats_as_mm_ss_hh() {
        assert_eq!(format_elapsed(Duration::ZERO), "00:00.00");
        assert_eq!(format_elapsed(Duration::from_millis(1_230)), "00:01.23");
        assert_eq!(format_elapsed(Duration::from_millis(61_450)), "01:01.45");
        assert_eq!(format_elapsed(Duration::from_secs(600)), "10:00.00");
    }

    #[test]
    fn stereo_downmix_sums_channels() {
        let frame = AudioFrame {
            samples: vec![100, 200, -300, 100],
            sample_rate: 16000,
            channels: 2,
            timestamp_ms: 0,
        };

        let mono = stereo_to_mono(frame);
        assert_eq!(mono.channels, 1);
        assert_eq!(mono.samples, vec![300, -200]);
    }

    #[test]
    fn downsample_decimates_by_ratio() {
        let frame = AudioFrame {
            samples: (0..80).collect(),
            sample_rate: 48000,
            channels: 1,
            timestamp_ms: 0,
        };

        let out = downsample_frame(frame, 16000);
        assert_eq!(out.sample_rate, 16000);
        assert_eq!(out.samples.len(), 27); // every 3rd sample
        assert_eq!(out.samples[1], 3);
    }

    #[test]
    fn wav_blob_round_trips() {
        let samples: Vec<i16> = (0..1600).map(|i| (i % 100) as i16).collect();
        let bytes = encode_wav(&samples, 16000, 1).unwrap();

        let reader = hound::WavReader::new(Cursor::new(&bytes)).unwrap();
        assert_eq!(reader.spec().sample_rate, 16000);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.len(), 1600);
    }
}
