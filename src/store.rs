//! Note persistence
//!
//! Notes live in memory as an ordered list and are persisted as a single
//! JSON blob on disk. Writes overwrite the whole blob (last writer wins,
//! no partial-write recovery). A corrupt blob degrades to an empty list
//! rather than blocking startup.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const NOTES_FILE: &str = "notes.json";
const THEME_FILE: &str = "theme";

/// A titled pairing of raw and polished transcript text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub raw_transcription: String,
    /// Polished rewrite of the raw transcription, as rich-text markup
    pub polished_note: String,
    /// Creation/last-save time, epoch milliseconds
    pub timestamp_ms: i64,
}

impl Note {
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: "Untitled Note".to_string(),
            raw_transcription: String::new(),
            polished_note: String::new(),
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        }
    }
}

impl Default for Note {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory note list backed by a JSON blob file.
pub struct NoteStore {
    notes_path: PathBuf,
    theme_path: PathBuf,
    notes: Vec<Note>,
}

impl NoteStore {
    /// Open the store rooted at `data_dir`, loading any existing blob.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data dir: {}", data_dir.display()))?;

        let mut store = Self {
            notes_path: data_dir.join(NOTES_FILE),
            theme_path: data_dir.join(THEME_FILE),
            notes: Vec::new(),
        };
        store.load();
        Ok(store)
    }

    /// Read and deserialize the blob. Fails soft: a missing or corrupt
    /// file leaves the store empty.
    fn load(&mut self) {
        let raw = match fs::read_to_string(&self.notes_path) {
            Ok(raw) => raw,
            Err(_) => {
                info!("No existing notes blob at {}", self.notes_path.display());
                return;
            }
        };

        match serde_json::from_str::<Vec<Note>>(&raw) {
            Ok(notes) => {
                self.notes = notes;
                self.sort();
                info!("Loaded {} notes", self.notes.len());
            }
            Err(e) => {
                warn!("Failed to parse notes blob, starting empty: {}", e);
                self.notes.clear();
            }
        }
    }

    /// Serialize and overwrite the blob.
    pub fn save(&mut self) -> Result<()> {
        self.sort();
        let raw = serde_json::to_string(&self.notes).context("Failed to serialize notes")?;
        fs::write(&self.notes_path, raw)
            .with_context(|| format!("Failed to write notes blob: {}", self.notes_path.display()))
    }

    /// Create a fresh blank note at the head of the list.
    pub fn create(&mut self) -> Note {
        let note = Note::new();
        self.notes.insert(0, note.clone());
        note
    }

    /// Remove a note by id. Returns true if a note was removed. The
    /// caller is responsible for keeping the store non-empty.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.notes.len();
        self.notes.retain(|n| n.id != id);
        self.notes.len() != before
    }

    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Note> {
        self.notes.iter_mut().find(|n| n.id == id)
    }

    /// Notes in descending-timestamp order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    fn sort(&mut self) {
        self.notes.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
    }

    /// Theme preference: "light", or absent meaning dark.
    pub fn theme(&self) -> Option<String> {
        fs::read_to_string(&self.theme_path)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    pub fn set_theme(&self, theme: Option<&str>) -> Result<()> {
        match theme {
            Some(t) => fs::write(&self.theme_path, t).context("Failed to write theme preference"),
            None => {
                if self.theme_path.exists() {
                    fs::remove_file(&self.theme_path).context("Failed to clear theme preference")?;
                }
                Ok(())
            }
        }
    }
}
