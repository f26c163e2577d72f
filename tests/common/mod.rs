// Shared test fixtures: a scripted speech service and WAV fixtures.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use voicenotes::{PipelineError, SpeechService};

/// Scripted stand-in for the hosted AI service. `None` results fail
/// the corresponding step; `delay_ms` simulates a slow network call.
pub struct ScriptedSpeech {
    pub transcript: Option<String>,
    pub polished: Option<String>,
    pub delay_ms: u64,
    pub transcribe_calls: AtomicUsize,
    pub polish_calls: AtomicUsize,
}

impl ScriptedSpeech {
    pub fn new(transcript: Option<&str>, polished: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            transcript: transcript.map(str::to_string),
            polished: polished.map(str::to_string),
            delay_ms: 0,
            transcribe_calls: AtomicUsize::new(0),
            polish_calls: AtomicUsize::new(0),
        })
    }

    pub fn with_delay(transcript: Option<&str>, polished: Option<&str>, delay_ms: u64) -> Arc<Self> {
        Arc::new(Self {
            transcript: transcript.map(str::to_string),
            polished: polished.map(str::to_string),
            delay_ms,
            transcribe_calls: AtomicUsize::new(0),
            polish_calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait::async_trait]
impl SpeechService for ScriptedSpeech {
    async fn transcribe_audio(
        &self,
        _audio: &[u8],
        _mime_type: &str,
    ) -> Result<String, PipelineError> {
        self.transcribe_calls.fetch_add(1, Ordering::SeqCst);
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
        self.transcript
            .clone()
            .ok_or_else(|| PipelineError::Transcription("scripted failure".to_string()))
    }

    async fn polish_transcript(&self, _raw_text: &str) -> Result<String, PipelineError> {
        self.polish_calls.fetch_add(1, Ordering::SeqCst);
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
        self.polished
            .clone()
            .ok_or_else(|| PipelineError::Polish("scripted failure".to_string()))
    }
}

/// Write a mono 16kHz WAV fixture with `num_samples` samples.
pub fn write_wav_fixture(dir: &Path, name: &str, num_samples: usize) -> PathBuf {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for i in 0..num_samples {
        writer.write_sample(((i % 200) as i16 - 100) * 50).unwrap();
    }
    writer.finalize().unwrap();
    path
}
