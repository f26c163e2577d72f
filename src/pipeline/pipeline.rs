use super::client::SpeechService;
use super::markdown;
use crate::error::PipelineError;
use crate::session::RecordedClip;
use std::sync::Arc;
use tracing::info;

/// Result of a successful polish step.
#[derive(Debug, Clone)]
pub struct PolishedNote {
    /// The Markdown as returned by the service
    pub markdown: String,
    /// Rich-text rendering of the Markdown
    pub html: String,
    /// Extracted title, if the Markdown yields one
    pub title: Option<String>,
}

/// Sequential transcribe-then-polish orchestration. The polish step is
/// gated on transcription succeeding; the caller applies each step's
/// result to the note as it arrives.
pub struct TranscriptionPipeline {
    service: Arc<dyn SpeechService>,
}

impl TranscriptionPipeline {
    pub fn new(service: Arc<dyn SpeechService>) -> Self {
        Self { service }
    }

    /// Step 1: speech-to-text over the recorded blob.
    pub async fn transcribe(&self, clip: &RecordedClip) -> Result<String, PipelineError> {
        if clip.wav_bytes.is_empty() {
            return Err(PipelineError::Encoding("empty audio payload".to_string()));
        }

        self.service
            .transcribe_audio(&clip.wav_bytes, clip.mime_type())
            .await
    }

    /// Step 2: rewrite the raw transcript into structured Markdown,
    /// render it as rich text, and extract a title.
    pub async fn polish(&self, raw_text: &str) -> Result<PolishedNote, PipelineError> {
        let md = self.service.polish_transcript(raw_text).await?;

        let html = markdown::to_html(&md);
        let title = markdown::extract_title(&md);

        info!(
            "Polish produced {} chars of markup (title: {:?})",
            html.len(),
            title
        );

        Ok(PolishedNote {
            markdown: md,
            html,
            title,
        })
    }
}
