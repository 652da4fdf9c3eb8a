//! # fieldnote-audio
//!
//! Microphone capture and remote-audio playback for fieldnote.
//!
//! Capture ([`Recorder`]) records the default input device to a temp WAV
//! file while publishing a rolling window of normalized amplitude samples
//! for live waveform display. Playback ([`Player`]) fetches a remote
//! recording, decodes it, and plays it with progress ticks and fractional
//! seeking.
//!
//! The cpal streams are owned by dedicated threads (cpal streams are not
//! `Send`); control flows through channels and atomic flags. All state the
//! UI binds to is published through `tokio::sync::watch` channels.

pub mod capture;
pub mod level;
pub mod playback;
pub mod transport;

pub use capture::{CaptureState, Recorder};
pub use level::{mean_amplitude, AmplitudeRing};
pub use playback::{format_time, PlaybackProgress, PlaybackState, Player};
pub use transport::Transport;
