//! Pure playback transport: position, progress, and seeking arithmetic.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Shared cursor over a decoded clip of interleaved PCM.
///
/// The output callback advances the cursor; UI tasks read progress and
/// seek. All arithmetic is frame-based so seeking never lands mid-frame on
/// multi-channel audio.
#[derive(Debug, Clone)]
pub struct Transport {
    total_samples: usize,
    sample_rate: u32,
    channels: u16,
    cursor: Arc<AtomicUsize>,
}

impl Transport {
    /// Create a transport over `total_samples` interleaved samples.
    pub fn new(total_samples: usize, sample_rate: u32, channels: u16) -> Self {
        Self {
            total_samples,
            sample_rate: sample_rate.max(1),
            channels: channels.max(1),
            cursor: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Current sample cursor.
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Relaxed).min(self.total_samples)
    }

    /// Advance the cursor by `n` samples, returning the previous position.
    pub fn advance(&self, n: usize) -> usize {
        self.cursor.fetch_add(n, Ordering::Relaxed)
    }

    /// Total clip duration.
    pub fn duration(&self) -> Duration {
        self.duration_of(self.total_samples)
    }

    /// Elapsed position.
    pub fn position(&self) -> Duration {
        self.duration_of(self.cursor())
    }

    /// Normalized progress in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        if self.total_samples == 0 {
            return 0.0;
        }
        (self.cursor() as f32 / self.total_samples as f32).clamp(0.0, 1.0)
    }

    /// Map a `[0, 1]` fraction to an absolute position.
    ///
    /// The target is aligned down to a frame boundary.
    pub fn seek(&self, fraction: f32) {
        let fraction = fraction.clamp(0.0, 1.0);
        let raw = (fraction * self.total_samples as f32) as usize;
        let aligned = raw - raw % self.channels as usize;
        self.cursor
            .store(aligned.min(self.total_samples), Ordering::Relaxed);
    }

    /// True once the cursor has consumed the whole clip.
    pub fn is_finished(&self) -> bool {
        self.cursor.load(Ordering::Relaxed) >= self.total_samples
    }

    fn duration_of(&self, samples: usize) -> Duration {
        let frames = samples as u64 / self.channels as u64;
        Duration::from_millis(frames * 1000 / self.sample_rate as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_mono() {
        // 10 seconds of mono audio at 8 kHz.
        let t = Transport::new(80_000, 8_000, 1);
        assert_eq!(t.duration(), Duration::from_secs(10));
    }

    #[test]
    fn test_seek_half_of_ten_seconds_is_five() {
        let t = Transport::new(80_000, 8_000, 1);
        t.seek(0.5);
        assert_eq!(t.position(), Duration::from_secs(5));
        assert!((t.progress() - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_seek_clamps_out_of_range() {
        let t = Transport::new(1000, 1000, 1);
        t.seek(2.0);
        assert_eq!(t.progress(), 1.0);
        assert!(t.is_finished());
        t.seek(-1.0);
        assert_eq!(t.progress(), 0.0);
    }

    #[test]
    fn test_seek_aligns_to_frame_boundary_stereo() {
        let t = Transport::new(1001, 1000, 2);
        t.seek(0.5);
        assert_eq!(t.cursor() % 2, 0);
    }

    #[test]
    fn test_advance_and_finish() {
        let t = Transport::new(100, 100, 1);
        assert!(!t.is_finished());
        t.advance(60);
        assert!(!t.is_finished());
        t.advance(60);
        assert!(t.is_finished());
        // Cursor reads saturate at the clip length.
        assert_eq!(t.cursor(), 100);
        assert_eq!(t.progress(), 1.0);
    }

    #[test]
    fn test_empty_clip() {
        let t = Transport::new(0, 44_100, 2);
        assert_eq!(t.progress(), 0.0);
        assert_eq!(t.duration(), Duration::ZERO);
        assert!(t.is_finished());
    }
}
