//! Rolling amplitude window for live waveform display.

use std::collections::VecDeque;

use fieldnote_core::defaults::AMPLITUDE_WINDOW;

/// Fixed-size rolling window of normalized amplitude samples.
///
/// Always holds exactly `window` entries in `[0, 1]`; pushing a new sample
/// drops the oldest. Starts (and resets to) all zeros so the waveform view
/// has a stable width before and after a recording.
#[derive(Debug, Clone)]
pub struct AmplitudeRing {
    samples: VecDeque<f32>,
    window: usize,
}

impl AmplitudeRing {
    /// Create a ring holding `window` samples, initialized to zero.
    pub fn new(window: usize) -> Self {
        Self {
            samples: std::iter::repeat(0.0).take(window).collect(),
            window,
        }
    }

    /// Append a sample, clamped to `[0, 1]`, dropping the oldest.
    pub fn push(&mut self, amplitude: f32) {
        self.samples.pop_front();
        self.samples.push_back(amplitude.clamp(0.0, 1.0));
        debug_assert_eq!(self.samples.len(), self.window);
    }

    /// Current window contents, oldest first.
    pub fn snapshot(&self) -> Vec<f32> {
        self.samples.iter().copied().collect()
    }

    /// Reset every slot to zero.
    pub fn reset(&mut self) {
        for slot in self.samples.iter_mut() {
            *slot = 0.0;
        }
    }
}

impl Default for AmplitudeRing {
    fn default() -> Self {
        Self::new(AMPLITUDE_WINDOW)
    }
}

/// Mean absolute amplitude of a chunk of float PCM, clamped to `[0, 1]`.
///
/// Returns 0.0 for an empty chunk (a stalled device reads as silence).
pub fn mean_amplitude(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s.abs()).sum();
    (sum / samples.len() as f32).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_starts_full_of_zeros() {
        let ring = AmplitudeRing::default();
        let snapshot = ring.snapshot();
        assert_eq!(snapshot.len(), AMPLITUDE_WINDOW);
        assert!(snapshot.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_ring_always_exactly_window_entries() {
        let mut ring = AmplitudeRing::new(30);
        for i in 0..100 {
            ring.push(i as f32 / 100.0);
            assert_eq!(ring.snapshot().len(), 30);
        }
    }

    #[test]
    fn test_ring_drops_oldest_first() {
        let mut ring = AmplitudeRing::new(3);
        ring.push(0.1);
        ring.push(0.2);
        ring.push(0.3);
        assert_eq!(ring.snapshot(), vec![0.1, 0.2, 0.3]);
        ring.push(0.4);
        assert_eq!(ring.snapshot(), vec![0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_ring_clamps_to_unit_interval() {
        let mut ring = AmplitudeRing::new(2);
        ring.push(3.5);
        ring.push(-1.0);
        let snapshot = ring.snapshot();
        assert_eq!(snapshot, vec![1.0, 0.0]);
        assert!(snapshot.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_ring_reset() {
        let mut ring = AmplitudeRing::new(4);
        ring.push(0.9);
        ring.reset();
        assert!(ring.snapshot().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_mean_amplitude() {
        assert_eq!(mean_amplitude(&[]), 0.0);
        assert_eq!(mean_amplitude(&[0.5, -0.5]), 0.5);
        assert_eq!(mean_amplitude(&[2.0, 2.0]), 1.0); // clamped
    }
}
