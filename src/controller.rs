//! Note session controller
//!
//! Composes the note store, recording session, transcription pipeline,
//! and autosave scheduler around a single current note. All mutation
//! goes through the controller's own methods behind one async mutex;
//! at most one mutation is in flight at a time.
//!
//! Pipeline results are applied to the note whose id was captured when
//! the recording started, never to whichever note happens to be
//! current when the result arrives. A result for a deleted note is
//! dropped.

use crate::audio::{AudioBackendConfig, AudioBackendFactory, AudioSource, BAR_COUNT};
use crate::autosave::AutosaveScheduler;
use crate::error::CaptureError;
use crate::pipeline::TranscriptionPipeline;
use crate::session::{RecordingSession, RecordingState, SessionConfig};
use crate::store::{Note, NoteStore};
use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Mutable state shared between the controller, the autosave task, and
/// in-flight pipeline tasks.
pub struct ControllerInner {
    pub(crate) store: NoteStore,
    pub(crate) current_id: String,
    pub(crate) session: Option<RecordingSession>,
    pub(crate) state: RecordingState,
    pub(crate) status: String,
    /// Transient save indicator. Kept separate from the status line so
    /// a commit landing after a pipeline failure never masks the
    /// failure report.
    pub(crate) saved: bool,
    pub(crate) saved_seq: u64,
    pub(crate) busy: BusyIndicators,
    /// Number of persisted writes (autosave commits)
    pub(crate) saves: u64,
}

impl ControllerInner {
    pub(crate) fn set_status(&mut self, status: String) {
        self.status = status;
    }

    /// Raise the save indicator, returning the new sequence number so
    /// the self-clear can tell whether a newer save superseded it.
    pub(crate) fn mark_saved(&mut self) -> u64 {
        self.saved = true;
        self.saved_seq += 1;
        self.saved_seq
    }
}

/// Per-field busy flags for the two pipeline steps.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct BusyIndicators {
    pub transcribing: bool,
    pub polishing: bool,
}

/// Snapshot of the live session for status rendering.
#[derive(Debug, Clone, Serialize)]
pub struct ControllerStatus {
    pub state: RecordingState,
    pub current_note_id: String,
    pub elapsed: String,
    pub waveform: Vec<f32>,
    pub status: String,
    /// Transient indicator: a save committed within the last moment
    pub saved: bool,
    pub busy: BusyIndicators,
    pub saves: u64,
}

/// Fields a client may edit on a note.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct NoteEdit {
    pub title: Option<String>,
    pub raw_transcription: Option<String>,
    pub polished_note: Option<String>,
}

pub struct NoteController {
    inner: Arc<Mutex<ControllerInner>>,
    autosave: AutosaveScheduler,
    pipeline: Arc<TranscriptionPipeline>,
    audio_source: AudioSource,
    backend_config: AudioBackendConfig,
    session_config: SessionConfig,
}

impl NoteController {
    /// Build the controller. An empty store immediately gets a fresh
    /// blank note so exactly one note is always current.
    pub fn new(
        mut store: NoteStore,
        pipeline: TranscriptionPipeline,
        audio_source: AudioSource,
        session_config: SessionConfig,
        autosave_debounce: Duration,
    ) -> Result<Self> {
        if store.is_empty() {
            store.create();
            store.save()?;
        }
        let current_id = store.notes()[0].id.clone();

        let inner = Arc::new(Mutex::new(ControllerInner {
            store,
            current_id,
            session: None,
            state: RecordingState::Idle,
            status: String::new(),
            saved: false,
            saved_seq: 0,
            busy: BusyIndicators::default(),
            saves: 0,
        }));

        let autosave = AutosaveScheduler::spawn(Arc::clone(&inner), autosave_debounce);

        let backend_config = AudioBackendConfig {
            target_sample_rate: session_config.sample_rate,
            target_channels: session_config.channels,
            ..AudioBackendConfig::default()
        };

        Ok(Self {
            inner,
            autosave,
            pipeline: Arc::new(pipeline),
            audio_source,
            backend_config,
            session_config,
        })
    }

    // ------------------------------------------------------------------
    // Note lifecycle
    // ------------------------------------------------------------------

    pub async fn list_notes(&self) -> Vec<Note> {
        self.inner.lock().await.store.notes().to_vec()
    }

    pub async fn get_note(&self, id: &str) -> Option<Note> {
        self.inner.lock().await.store.get(id).cloned()
    }

    pub async fn current_note(&self) -> Note {
        let inner = self.inner.lock().await;
        inner
            .store
            .get(&inner.current_id)
            .cloned()
            .unwrap_or_else(Note::new)
    }

    /// Create a fresh blank note and make it current. An active
    /// recording is stopped first.
    pub async fn create_note(&self) -> Result<Note> {
        let mut inner = self.inner.lock().await;
        self.force_stop_active(&mut inner).await;

        let note = inner.store.create();
        inner.store.save()?;
        inner.current_id = note.id.clone();
        info!("Created note {}", note.id);
        Ok(note)
    }

    /// Make an existing note current. An active recording is stopped
    /// first (its pipeline result still lands on the old note).
    pub async fn select_note(&self, id: &str) -> Option<Note> {
        let mut inner = self.inner.lock().await;
        let note = inner.store.get(id).cloned()?;

        if inner.current_id != id {
            self.force_stop_active(&mut inner).await;
            inner.current_id = note.id.clone();
        }
        Some(note)
    }

    /// Delete a note. The store is never left empty: deleting the last
    /// note synthesizes a fresh blank one.
    pub async fn delete_note(&self, id: &str) -> Result<bool> {
        let mut inner = self.inner.lock().await;

        if inner.current_id == id {
            self.force_stop_active(&mut inner).await;
        }

        if !inner.store.delete(id) {
            return Ok(false);
        }

        if inner.store.is_empty() {
            let fresh = inner.store.create();
            inner.current_id = fresh.id.clone();
        } else if inner.current_id == id {
            inner.current_id = inner.store.notes()[0].id.clone();
        }

        inner.store.save()?;
        info!("Deleted note {}", id);
        Ok(true)
    }

    /// Apply an edit and schedule a debounced save.
    pub async fn edit_note(&self, id: &str, edit: NoteEdit) -> Option<Note> {
        let note = {
            let mut inner = self.inner.lock().await;
            let note = inner.store.get_mut(id)?;

            if let Some(title) = edit.title {
                note.title = title;
            }
            if let Some(raw) = edit.raw_transcription {
                note.raw_transcription = raw;
            }
            if let Some(polished) = edit.polished_note {
                note.polished_note = polished;
            }
            note.clone()
        };

        self.autosave.schedule(id);
        Some(note)
    }

    // ------------------------------------------------------------------
    // Recording
    // ------------------------------------------------------------------

    /// Toggle the recording state: start when idle, stop-and-transcribe
    /// when active. Failures surface as status messages, never errors.
    pub async fn toggle_recording(&self) -> ControllerStatus {
        let mut inner = self.inner.lock().await;

        if inner.session.is_some() {
            self.stop_recording_locked(&mut inner).await;
        } else {
            self.start_recording_locked(&mut inner).await;
        }

        Self::status_locked(&inner)
    }

    pub async fn status(&self) -> ControllerStatus {
        let inner = self.inner.lock().await;
        Self::status_locked(&inner)
    }

    async fn start_recording_locked(&self, inner: &mut ControllerInner) {
        inner.state = RecordingState::Requesting;
        inner.set_status("Requesting microphone access...".to_string());

        let backend = match AudioBackendFactory::create(
            self.audio_source.clone(),
            self.backend_config.clone(),
        ) {
            Ok(b) => b,
            Err(e) => {
                inner.state = RecordingState::Idle;
                inner.set_status(e.to_string());
                warn!("Could not create audio backend: {}", e);
                return;
            }
        };

        let mut session = RecordingSession::new(backend, self.session_config.clone());
        match session.start().await {
            Ok(()) => {
                inner.session = Some(session);
                inner.state = RecordingState::Active;
                inner.set_status("Recording...".to_string());
            }
            Err(e) => {
                // Session start leaves nothing running on failure
                inner.state = RecordingState::Idle;
                inner.set_status(e.to_string());
                warn!("Recording start failed: {}", e);
            }
        }
    }

    async fn stop_recording_locked(&self, inner: &mut ControllerInner) {
        let Some(session) = inner.session.take() else {
            return;
        };

        inner.state = RecordingState::Stopping;
        let note_id = inner.current_id.clone();

        match session.stop().await {
            Ok(clip) => {
                inner.state = RecordingState::Idle;
                inner.busy.transcribing = true;
                inner.set_status("Transcribing...".to_string());

                let pipeline = Arc::clone(&self.pipeline);
                let shared = Arc::clone(&self.inner);
                let autosave = self.autosave.clone();
                tokio::spawn(async move {
                    run_pipeline(shared, autosave, pipeline, note_id, clip).await;
                });
            }
            Err(CaptureError::EmptyCapture) => {
                // Pipeline is not invoked for an empty capture
                inner.state = RecordingState::Idle;
                inner.set_status(CaptureError::EmptyCapture.to_string());
            }
            Err(e) => {
                inner.state = RecordingState::Idle;
                inner.set_status(e.to_string());
                warn!("Recording stop failed: {}", e);
            }
        }
    }

    /// Best-effort stop used when switching or deleting the current
    /// note while recording.
    async fn force_stop_active(&self, inner: &mut ControllerInner) {
        if inner.session.is_some() {
            info!("Active recording stopped by note switch");
            self.stop_recording_locked(inner).await;
        }
    }

    fn status_locked(inner: &ControllerInner) -> ControllerStatus {
        let (elapsed, waveform) = match &inner.session {
            Some(session) => (
                session.elapsed_display(),
                session.waveform_bars().to_vec(),
            ),
            None => (
                crate::session::RecordingSession::idle_elapsed(),
                vec![0.0; BAR_COUNT],
            ),
        };

        ControllerStatus {
            state: inner.state,
            current_note_id: inner.current_id.clone(),
            elapsed,
            waveform,
            status: inner.status.clone(),
            saved: inner.saved,
            busy: inner.busy,
            saves: inner.saves,
        }
    }

    // ------------------------------------------------------------------
    // Theme preference
    // ------------------------------------------------------------------

    pub async fn theme(&self) -> Option<String> {
        self.inner.lock().await.store.theme()
    }

    pub async fn set_theme(&self, theme: Option<&str>) -> Result<()> {
        self.inner.lock().await.store.set_theme(theme)
    }
}

/// Run the two pipeline steps against the note captured at recording
/// start, applying each result as it arrives.
async fn run_pipeline(
    inner: Arc<Mutex<ControllerInner>>,
    autosave: AutosaveScheduler,
    pipeline: Arc<TranscriptionPipeline>,
    note_id: String,
    clip: crate::session::RecordedClip,
) {
    let raw = match pipeline.transcribe(&clip).await {
        Ok(raw) => raw,
        Err(e) => {
            let mut guard = inner.lock().await;
            guard.busy.transcribing = false;
            guard.set_status(e.to_string());
            warn!("Transcription failed for note {}: {}", note_id, e);
            return;
        }
    };

    {
        let mut guard = inner.lock().await;
        guard.busy.transcribing = false;

        let Some(note) = guard.store.get_mut(&note_id) else {
            info!("Dropping transcript for deleted note {}", note_id);
            return;
        };
        note.raw_transcription = raw.clone();
        guard.busy.polishing = true;
        guard.set_status("Polishing note...".to_string());
    }
    autosave.schedule(&note_id);

    match pipeline.polish(&raw).await {
        Ok(polished) => {
            let mut guard = inner.lock().await;
            guard.busy.polishing = false;

            let Some(note) = guard.store.get_mut(&note_id) else {
                info!("Dropping polish result for deleted note {}", note_id);
                return;
            };
            note.polished_note = polished.html;
            if let Some(title) = polished.title {
                note.title = title;
            }
            guard.set_status("Note ready".to_string());
            drop(guard);
            autosave.schedule(&note_id);
        }
        Err(e) => {
            // Partial success: the raw transcript stays in place
            let mut guard = inner.lock().await;
            guard.busy.polishing = false;
            guard.set_status(e.to_string());
            warn!("Polish failed for note {}: {}", note_id, e);
        }
    }
}
