use serde::Serialize;

/// Recording lifecycle state.
///
/// `Idle -> Requesting -> Active -> Stopping -> Idle`. A failed
/// permission request drops straight back to `Idle` with a status
/// message; it never propagates to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    Idle,
    Requesting,
    Active,
    Stopping,
}
