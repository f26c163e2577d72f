use serde::{Deserialize, Serialize};

/// Configuration for a recording session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Sample rate the captured audio is converted to
    pub sample_rate: u32,

    /// Number of audio channels (1 = mono, 2 = stereo)
    pub channels: u16,

    /// Interval between waveform recomputations (~one display frame)
    pub waveform_interval_ms: u64,

    /// Interval between elapsed-time display updates
    pub timer_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            waveform_interval_ms: 33, // ~30fps
            timer_interval_ms: 50,
        }
    }
}
