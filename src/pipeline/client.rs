//! Hosted AI service client
//!
//! Two request shapes against a generateContent-style endpoint: a
//! multimodal request carrying a fixed instruction plus inline base64
//! audio, and a text-only request carrying the rewriting instruction
//! plus the raw transcript.

use crate::config::SpeechConfig;
use crate::error::PipelineError;
use anyhow::{Context, Result};
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

/// Instruction for the speech-to-text call.
const TRANSCRIBE_INSTRUCTION: &str =
    "Generate a complete, detailed transcript of this audio. Output only the transcript text.";

/// Instruction for the raw-transcript rewrite.
const POLISH_INSTRUCTION: &str = "Take this raw transcription and create a polished, \
well-formatted note. Remove filler words (um, uh, like), repetitions, and false starts. \
Apply structural Markdown: headings, lists, and emphasis where appropriate. Preserve all \
of the original content and meaning. Output only the polished note.\n\nRaw transcription:\n";

/// Boundary to the external speech/polish service. Tests inject a
/// scripted implementation.
#[async_trait::async_trait]
pub trait SpeechService: Send + Sync {
    /// Speech-to-text over an encoded audio blob.
    async fn transcribe_audio(&self, audio: &[u8], mime_type: &str)
        -> Result<String, PipelineError>;

    /// Rewrite a raw transcript into structured Markdown.
    async fn polish_transcript(&self, raw_text: &str) -> Result<String, PipelineError>;
}

pub struct GeminiClient {
    http: Client,
    api_base: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// Build a client from config, reading the API key from the
    /// configured environment variable.
    pub fn from_config(config: &SpeechConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .with_context(|| format!("API key not set: {}", config.api_key_env))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    async fn generate(&self, parts: Vec<Part>) -> Result<String, String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        );

        let request = GenerateRequest {
            contents: vec![Content { parts }],
        };

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("AI service error ({}): {}", status.as_u16(), body);
            return Err(format!("service returned {}", status.as_u16()));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| format!("failed to parse response: {}", e))?;

        body.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().find_map(|p| p.text))
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| "empty response from service".to_string())
    }
}

#[async_trait::async_trait]
impl SpeechService for GeminiClient {
    async fn transcribe_audio(
        &self,
        audio: &[u8],
        mime_type: &str,
    ) -> Result<String, PipelineError> {
        let data = base64::engine::general_purpose::STANDARD.encode(audio);

        info!(
            "Transcribing audio: {} bytes ({}), model {}",
            audio.len(),
            mime_type,
            self.model
        );

        let parts = vec![
            Part::text(TRANSCRIBE_INSTRUCTION),
            Part::inline_data(mime_type, data),
        ];

        let text = self
            .generate(parts)
            .await
            .map_err(PipelineError::Transcription)?;

        info!("Transcription successful: {} chars", text.len());
        Ok(text.trim().to_string())
    }

    async fn polish_transcript(&self, raw_text: &str) -> Result<String, PipelineError> {
        info!("Polishing transcript: {} chars", raw_text.len());

        let prompt = format!("{}{}", POLISH_INSTRUCTION, raw_text);
        let text = self
            .generate(vec![Part::text(prompt)])
            .await
            .map_err(PipelineError::Polish)?;

        info!("Polish successful: {} chars", text.len());
        Ok(text.trim().to_string())
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    fn inline_data(mime_type: &str, data: String) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.to_string(),
                data,
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}
