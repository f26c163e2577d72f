//! Autosave scheduler
//!
//! Trailing debounce over note edits: every scheduled edit resets the
//! window, and only the last edit within it is committed. A commit
//! stamps the note, re-sorts the store, persists the blob, and raises
//! a transient saved indicator that clears itself. The indicator is a
//! surface of its own; the status line keeps whatever report it holds.

use crate::controller::ControllerInner;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info};

/// How long the saved indicator stays up before self-clearing.
const SAVED_INDICATOR_MS: u64 = 1200;

#[derive(Clone)]
pub struct AutosaveScheduler {
    tx: mpsc::Sender<String>,
}

impl AutosaveScheduler {
    /// Spawn the debounce task over the shared controller state.
    pub fn spawn(inner: Arc<Mutex<ControllerInner>>, delay: Duration) -> Self {
        let (tx, mut rx) = mpsc::channel::<String>(64);

        tokio::spawn(async move {
            let mut pending: Option<String> = None;

            loop {
                match pending.take() {
                    None => match rx.recv().await {
                        Some(id) => pending = Some(id),
                        None => break,
                    },
                    Some(note_id) => {
                        tokio::select! {
                            msg = rx.recv() => match msg {
                                // A newer edit resets the window; only the
                                // trailing edit commits.
                                Some(id) => pending = Some(id),
                                None => {
                                    commit(&inner, &note_id).await;
                                    break;
                                }
                            },
                            _ = tokio::time::sleep(delay) => {
                                commit(&inner, &note_id).await;
                            }
                        }
                    }
                }
            }

            debug!("Autosave task stopped");
        });

        Self { tx }
    }

    /// Schedule a save of the given note. Resets any pending window.
    pub fn schedule(&self, note_id: &str) {
        if self.tx.try_send(note_id.to_string()).is_err() {
            error!("Autosave queue full, dropping schedule request");
        }
    }
}

/// Persist the note's current fields. A note deleted since scheduling
/// makes the commit a no-op.
async fn commit(inner: &Arc<Mutex<ControllerInner>>, note_id: &str) {
    let seq = {
        let mut guard = inner.lock().await;

        match guard.store.get_mut(note_id) {
            Some(note) => {
                note.timestamp_ms = chrono::Utc::now().timestamp_millis();
            }
            None => {
                debug!("Autosave skipped, note {} no longer exists", note_id);
                return;
            }
        }

        if let Err(e) = guard.store.save() {
            error!("Autosave failed: {:#}", e);
            guard.set_status(format!("Save failed: {}", e));
            return;
        }

        guard.saves += 1;
        info!("Autosaved note {}", note_id);
        guard.mark_saved()
    };

    // Self-clearing: only drops the indicator if no newer save landed.
    let inner = Arc::clone(inner);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(SAVED_INDICATOR_MS)).await;
        let mut guard = inner.lock().await;
        if guard.saved_seq == seq {
            guard.saved = false;
        }
    });
}
