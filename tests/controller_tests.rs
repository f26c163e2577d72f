// Integration tests for the note session controller
//
// These tests drive the full record -> transcribe -> polish -> autosave
// flow through the WAV file backend and a scripted speech service.

mod common;

use anyhow::Result;
use common::{write_wav_fixture, ScriptedSpeech};
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use voicenotes::{
    AudioSource, NoteController, NoteEdit, NoteStore, RecordingState, SessionConfig,
    TranscriptionPipeline,
};

const FAST_DEBOUNCE_MS: u64 = 50;

fn build_controller(
    data_dir: &Path,
    audio_file: &Path,
    speech: Arc<ScriptedSpeech>,
) -> Result<NoteController> {
    let store = NoteStore::open(data_dir)?;
    let pipeline = TranscriptionPipeline::new(speech);

    NoteController::new(
        store,
        pipeline,
        AudioSource::File(audio_file.to_string_lossy().into_owned()),
        SessionConfig::default(),
        Duration::from_millis(FAST_DEBOUNCE_MS),
    )
}

/// Wait for any in-flight pipeline work and debounced saves to settle.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(400)).await;
}

#[tokio::test]
async fn test_startup_creates_a_current_note() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let fixture = write_wav_fixture(temp_dir.path(), "clip.wav", 1600);
    let speech = ScriptedSpeech::new(Some("hello"), Some("hello"));

    let controller = build_controller(temp_dir.path(), &fixture, speech)?;

    let notes = controller.list_notes().await;
    assert_eq!(notes.len(), 1, "Empty store gets a fresh blank note");
    assert_eq!(controller.status().await.current_note_id, notes[0].id);
    Ok(())
}

#[tokio::test]
async fn test_delete_never_leaves_store_empty() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let fixture = write_wav_fixture(temp_dir.path(), "clip.wav", 1600);
    let speech = ScriptedSpeech::new(Some("hello"), Some("hello"));

    let controller = build_controller(temp_dir.path(), &fixture, speech)?;

    // Delete through several generations of "last note"
    for _ in 0..3 {
        let current = controller.current_note().await;
        assert!(controller.delete_note(&current.id).await?);

        let notes = controller.list_notes().await;
        assert_eq!(notes.len(), 1, "A fresh blank note is synthesized");
        assert_ne!(notes[0].id, current.id);
    }
    Ok(())
}

#[tokio::test]
async fn test_autosave_debounces_to_single_write() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let fixture = write_wav_fixture(temp_dir.path(), "clip.wav", 1600);
    let speech = ScriptedSpeech::new(Some("hello"), Some("hello"));

    let controller = build_controller(temp_dir.path(), &fixture, speech)?;
    let note = controller.current_note().await;

    // Burst of edits inside the debounce window
    for i in 1..=5 {
        controller
            .edit_note(
                &note.id,
                NoteEdit {
                    title: Some(format!("Edit {}", i)),
                    ..NoteEdit::default()
                },
            )
            .await
            .expect("note exists");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    settle().await;

    let status = controller.status().await;
    assert_eq!(status.saves, 1, "Burst commits exactly one write");
    assert!(status.saved, "Commit raises the transient saved indicator");

    // The persisted blob reflects the trailing edit
    let reloaded = NoteStore::open(temp_dir.path())?;
    assert_eq!(reloaded.get(&note.id).unwrap().title, "Edit 5");
    Ok(())
}

#[tokio::test]
async fn test_record_toggle_runs_both_pipeline_steps() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let fixture = write_wav_fixture(temp_dir.path(), "clip.wav", 16000);
    let speech = ScriptedSpeech::new(
        Some("um so this is the raw transcript"),
        Some("# Standup Summary\n\n- first point\n- second point"),
    );

    let controller = build_controller(temp_dir.path(), &fixture, Arc::clone(&speech))?;
    let note = controller.current_note().await;

    let status = controller.toggle_recording().await;
    assert_eq!(status.state, RecordingState::Active);

    tokio::time::sleep(Duration::from_millis(200)).await;

    let status = controller.toggle_recording().await;
    assert_eq!(status.state, RecordingState::Idle);

    settle().await;

    assert_eq!(speech.transcribe_calls.load(Ordering::SeqCst), 1);
    assert_eq!(speech.polish_calls.load(Ordering::SeqCst), 1);

    let updated = controller.get_note(&note.id).await.unwrap();
    assert_eq!(updated.raw_transcription, "um so this is the raw transcript");
    assert!(updated.polished_note.contains("<h1>Standup Summary</h1>"));
    assert!(updated.polished_note.contains("<li>first point</li>"));
    assert_eq!(updated.title, "Standup Summary");

    // Both steps triggered autosave
    let reloaded = NoteStore::open(temp_dir.path())?;
    assert_eq!(reloaded.get(&note.id).unwrap().title, "Standup Summary");
    Ok(())
}

#[tokio::test]
async fn test_empty_capture_skips_pipeline() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let fixture = write_wav_fixture(temp_dir.path(), "silent.wav", 0);
    let speech = ScriptedSpeech::new(Some("should never appear"), Some("nope"));

    let controller = build_controller(temp_dir.path(), &fixture, Arc::clone(&speech))?;

    controller.toggle_recording().await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    let status = controller.toggle_recording().await;

    assert_eq!(status.state, RecordingState::Idle);
    assert!(
        status.status.contains("No audio"),
        "status was: {}",
        status.status
    );

    settle().await;
    assert_eq!(
        speech.transcribe_calls.load(Ordering::SeqCst),
        0,
        "Pipeline must not run for an empty capture"
    );
    Ok(())
}

#[tokio::test]
async fn test_polish_failure_preserves_raw_transcript() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let fixture = write_wav_fixture(temp_dir.path(), "clip.wav", 16000);
    let speech = ScriptedSpeech::new(Some("raw words survive"), None);

    let controller = build_controller(temp_dir.path(), &fixture, speech)?;
    let note = controller.current_note().await;
    let polished_before = note.polished_note.clone();

    controller.toggle_recording().await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    controller.toggle_recording().await;

    settle().await;

    let updated = controller.get_note(&note.id).await.unwrap();
    assert_eq!(updated.raw_transcription, "raw words survive");
    assert_eq!(
        updated.polished_note, polished_before,
        "Polish failure must not clear the polished field"
    );

    // The raw transcript's autosave has committed by now; the saved
    // indicator and the failure report are independent surfaces.
    let status = controller.status().await;
    assert!(status.saves >= 1, "raw transcript autosave committed");
    assert!(
        status.status.contains("Polishing failed"),
        "commit must not mask the failure report, status was: {}",
        status.status
    );
    Ok(())
}

#[tokio::test]
async fn test_transcription_failure_halts_pipeline() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let fixture = write_wav_fixture(temp_dir.path(), "clip.wav", 16000);
    let speech = ScriptedSpeech::new(None, Some("unused"));

    let controller = build_controller(temp_dir.path(), &fixture, Arc::clone(&speech))?;

    controller.toggle_recording().await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    controller.toggle_recording().await;

    settle().await;

    assert_eq!(speech.transcribe_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        speech.polish_calls.load(Ordering::SeqCst),
        0,
        "Polish is gated on transcription succeeding"
    );

    let status = controller.status().await;
    assert!(status.status.contains("Transcription failed"));
    Ok(())
}

#[tokio::test]
async fn test_late_pipeline_result_lands_on_recorded_note() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let fixture = write_wav_fixture(temp_dir.path(), "clip.wav", 16000);
    // Slow service: results arrive after the user has switched notes
    let speech = ScriptedSpeech::with_delay(Some("late transcript"), Some("late polish"), 150);

    let controller = build_controller(temp_dir.path(), &fixture, speech)?;
    let recorded_note = controller.current_note().await;

    controller.toggle_recording().await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    controller.toggle_recording().await;

    // Switch to a fresh note while the pipeline is still in flight
    let fresh = controller.create_note().await?;

    tokio::time::sleep(Duration::from_millis(600)).await;

    let old = controller.get_note(&recorded_note.id).await.unwrap();
    assert_eq!(old.raw_transcription, "late transcript");

    let new = controller.get_note(&fresh.id).await.unwrap();
    assert!(
        new.raw_transcription.is_empty(),
        "The late result must not leak into the newly current note"
    );
    Ok(())
}

#[tokio::test]
async fn test_deleting_note_mid_pipeline_drops_result() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let fixture = write_wav_fixture(temp_dir.path(), "clip.wav", 16000);
    let speech = ScriptedSpeech::with_delay(Some("orphan transcript"), Some("orphan"), 150);

    let controller = build_controller(temp_dir.path(), &fixture, speech)?;
    let recorded_note = controller.current_note().await;

    controller.toggle_recording().await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    controller.toggle_recording().await;

    assert!(controller.delete_note(&recorded_note.id).await?);

    tokio::time::sleep(Duration::from_millis(600)).await;

    // The result had nowhere to land; no note carries it
    for note in controller.list_notes().await {
        assert!(note.raw_transcription.is_empty());
    }
    Ok(())
}

#[tokio::test]
async fn test_note_switch_while_recording_forces_stop() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let fixture = write_wav_fixture(temp_dir.path(), "clip.wav", 16000);
    let speech = ScriptedSpeech::new(Some("stopped early"), Some("stopped early"));

    let controller = build_controller(temp_dir.path(), &fixture, speech)?;
    let recorded_note = controller.current_note().await;

    controller.toggle_recording().await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(controller.status().await.state, RecordingState::Active);

    // Creating a new note while recording stops the session first
    let fresh = controller.create_note().await?;
    assert_eq!(controller.status().await.state, RecordingState::Idle);
    assert_eq!(controller.status().await.current_note_id, fresh.id);

    settle().await;

    // The stopped recording's transcript still reached the old note
    let old = controller.get_note(&recorded_note.id).await.unwrap();
    assert_eq!(old.raw_transcription, "stopped early");
    Ok(())
}
