use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use tracing::info;
use voicenotes::{
    create_router, AppState, AudioSource, Config, GeminiClient, NoteController, NoteStore,
    SessionConfig, TranscriptionPipeline,
};

#[derive(Debug, Parser)]
#[command(name = "voicenotes", about = "Voice notes recording and transcription service")]
struct Args {
    /// Config file (without extension), e.g. config/voicenotes
    #[arg(long)]
    config: Option<String>,

    /// Record from a WAV file instead of the microphone
    #[arg(long)]
    audio_file: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let cfg = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    info!("{} starting", cfg.service.name);
    info!(
        "HTTP server will bind to {}:{}",
        cfg.service.http.bind, cfg.service.http.port
    );
    info!("Data dir: {}", cfg.storage.data_dir.display());

    let store = NoteStore::open(&cfg.storage.data_dir)?;

    let client = GeminiClient::from_config(&cfg.speech)?;
    let pipeline = TranscriptionPipeline::new(std::sync::Arc::new(client));

    let audio_source = match args.audio_file {
        Some(path) => AudioSource::File(path),
        None => AudioSource::Microphone,
    };

    let session_config = SessionConfig {
        sample_rate: cfg.audio.sample_rate,
        channels: cfg.audio.channels,
        ..SessionConfig::default()
    };

    let controller = NoteController::new(
        store,
        pipeline,
        audio_source,
        session_config,
        Duration::from_millis(cfg.autosave.debounce_ms),
    )?;

    let app = create_router(AppState::new(controller));

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Listening on {}", addr);
    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}
