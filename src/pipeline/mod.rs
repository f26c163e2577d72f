//! Transcription pipeline
//!
//! Two sequential calls against the hosted AI service: speech-to-text
//! over the recorded blob, then a Markdown-structured rewrite of the
//! raw transcript. The second call is gated on the first succeeding,
//! and a polish failure never discards the raw transcript.

mod client;
mod markdown;
mod pipeline;

pub use client::{GeminiClient, SpeechService};
pub use markdown::{extract_title, to_html};
pub use pipeline::{PolishedNote, TranscriptionPipeline};
