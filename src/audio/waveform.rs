//! Waveform visualization buffer
//!
//! Collects recent samples from the capture stream and reduces them to
//! a fixed number of bar magnitudes for live rendering. The bar count
//! is half the analysis bin count, each bar is the normalized RMS of
//! its segment, and bars are smoothed with an EMA so the display does
//! not flicker between ticks.

use std::collections::VecDeque;

/// Number of analysis bins over the sample window
const ANALYSIS_BINS: usize = 64;

/// Number of visualization bars (half the bin count)
pub const BAR_COUNT: usize = ANALYSIS_BINS / 2;

/// Buffer capacity (~200ms at 48kHz mono)
const BUFFER_CAPACITY: usize = 10_000;

/// EMA smoothing factor (0.3 = 30% new value, 70% previous)
const EMA_ALPHA: f32 = 0.3;

pub struct WaveformBuffer {
    samples: VecDeque<i16>,
    capacity: usize,
    smoothed: [f32; BAR_COUNT],
}

impl WaveformBuffer {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(BUFFER_CAPACITY),
            capacity: BUFFER_CAPACITY,
            smoothed: [0.0; BAR_COUNT],
        }
    }

    /// Add samples, discarding the oldest once at capacity.
    pub fn push_samples(&mut self, samples: &[i16]) {
        let len = samples.len();

        if len >= self.capacity {
            self.samples.clear();
            self.samples.extend(&samples[len - self.capacity..]);
            return;
        }

        let to_remove = (self.samples.len() + len).saturating_sub(self.capacity);
        if to_remove > 0 {
            self.samples.drain(0..to_remove);
        }

        self.samples.extend(samples);
    }

    /// Recompute smoothed bar magnitudes from the current window.
    ///
    /// Called once per display tick. Each bar is the RMS of its segment
    /// of the window, normalized to 0.0..=1.0.
    pub fn tick(&mut self) -> [f32; BAR_COUNT] {
        let raw = self.compute_bars();
        for (s, r) in self.smoothed.iter_mut().zip(raw.iter()) {
            *s = *s * (1.0 - EMA_ALPHA) + *r * EMA_ALPHA;
        }
        self.smoothed
    }

    /// Current smoothed bars without recomputing.
    pub fn bars(&self) -> [f32; BAR_COUNT] {
        self.smoothed
    }

    fn compute_bars(&self) -> [f32; BAR_COUNT] {
        let mut bars = [0.0f32; BAR_COUNT];

        if self.samples.is_empty() {
            return bars;
        }

        let samples_per_bar = (self.samples.len() / BAR_COUNT).max(1);

        for (bar_idx, bar) in bars.iter_mut().enumerate() {
            let start = bar_idx * samples_per_bar;
            let end = ((bar_idx + 1) * samples_per_bar).min(self.samples.len());

            if start >= self.samples.len() || start == end {
                break;
            }

            let count = end - start;
            let sum_squares: f64 = (start..end)
                .map(|i| {
                    let normalized = self.samples[i] as f64 / i16::MAX as f64;
                    normalized * normalized
                })
                .sum();

            let rms = (sum_squares / count as f64).sqrt();
            *bar = (rms as f32).clamp(0.0, 1.0);
        }

        bars
    }
}

impl Default for WaveformBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_count_is_half_the_bin_count() {
        assert_eq!(BAR_COUNT, ANALYSIS_BINS / 2);
    }

    #[test]
    fn empty_buffer_yields_silent_bars() {
        let mut buf = WaveformBuffer::new();
        assert!(buf.tick().iter().all(|&b| b == 0.0));
    }

    #[test]
    fn loud_signal_raises_bars() {
        let mut buf = WaveformBuffer::new();
        buf.push_samples(&vec![i16::MAX / 2; 4096]);

        let bars = buf.tick();
        assert!(bars.iter().any(|&b| b > 0.1));
        assert!(bars.iter().all(|&b| (0.0..=1.0).contains(&b)));
    }

    #[test]
    fn smoothing_decays_after_silence() {
        let mut buf = WaveformBuffer::new();
        buf.push_samples(&vec![i16::MAX / 2; 4096]);
        let loud = buf.tick();

        // Overwrite the window with silence; bars should fall but not
        // drop straight to zero in a single tick.
        buf.push_samples(&vec![0i16; BUFFER_CAPACITY]);
        let quiet = buf.tick();

        assert!(quiet[0] < loud[0]);
        assert!(quiet[0] > 0.0);
    }

    #[test]
    fn overfull_push_keeps_latest_samples() {
        let mut buf = WaveformBuffer::new();
        let mut samples = vec![0i16; BUFFER_CAPACITY + 500];
        let len = samples.len();
        for s in samples[len - 500..].iter_mut() {
            *s = i16::MAX / 2;
        }

        buf.push_samples(&samples);
        let bars = buf.tick();

        // The loud tail survives the truncation
        assert!(bars[BAR_COUNT - 1] > 0.0);
    }
}
