//! Remote audio playback: Stopped → Preparing → Playing → Stopped.
//!
//! The player fetches a remote recording, decodes it in full, and feeds a
//! cpal output stream owned by a dedicated thread. Progress is published
//! on a fixed cadence through a watch channel; seeking maps a `[0, 1]`
//! fraction onto the shared [`Transport`] cursor.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tokio::sync::{oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use fieldnote_core::defaults::PROGRESS_INTERVAL_MS;
use fieldnote_core::{Error, Result};

use crate::transport::Transport;

/// Playback lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Preparing,
    Playing,
}

/// Snapshot published to UI bindings on every progress tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackProgress {
    pub state: PlaybackState,
    /// Normalized progress in `[0, 1]`.
    pub progress: f32,
    /// Elapsed position.
    pub position: Duration,
    /// Total clip duration.
    pub duration: Duration,
}

/// Render a millisecond count as `MM:SS` for UI binding.
pub fn format_time(millis: u64) -> String {
    let total_seconds = millis / 1000;
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

struct Active {
    url: String,
    transport: Transport,
    stop: Arc<AtomicBool>,
    ticker: JoinHandle<()>,
}

/// Player for remote recordings.
///
/// Starting playback of the URL that is already playing toggles it off
/// (re-tap acts as stop). Completion returns to Stopped and invokes the
/// caller-supplied callback.
pub struct Player {
    http: reqwest::Client,
    inner: Mutex<Option<Active>>,
    progress_tx: watch::Sender<PlaybackProgress>,
}

impl Player {
    pub fn new() -> Self {
        let (progress_tx, _) = watch::channel(PlaybackProgress::default());
        Self {
            http: reqwest::Client::new(),
            inner: Mutex::new(None),
            progress_tx,
        }
    }

    /// Progress snapshots, ~10 per second while playing.
    pub fn progress(&self) -> watch::Receiver<PlaybackProgress> {
        self.progress_tx.subscribe()
    }

    /// True iff `url` is the clip currently playing.
    pub async fn is_playing(&self, url: &str) -> bool {
        let inner = self.inner.lock().await;
        inner
            .as_ref()
            .map(|a| a.url == url && !a.stop.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    /// Start playing `url`, or stop if that URL is already playing.
    ///
    /// `on_complete` runs once when the clip plays to its end; it is not
    /// invoked for manual stops or toggles.
    pub async fn play<F>(&self, url: &str, on_complete: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut inner = self.inner.lock().await;

        if let Some(active) = inner.as_ref() {
            let still_running =
                !active.stop.load(Ordering::Relaxed) && !active.transport.is_finished();
            if active.url == url && still_running {
                // Re-tap on the same clip: toggle off.
                debug!(
                    subsystem = "audio",
                    component = "player",
                    op = "play",
                    url,
                    "Toggling off current playback"
                );
                Self::halt(&mut inner);
                self.publish_stopped();
                return Ok(());
            }
        }
        Self::halt(&mut inner);

        let _ = self.progress_tx.send(PlaybackProgress {
            state: PlaybackState::Preparing,
            ..PlaybackProgress::default()
        });

        let prepared = self.prepare(url).await;
        let (samples, sample_rate, channels) = match prepared {
            Ok(clip) => clip,
            Err(e) => {
                self.publish_stopped();
                return Err(e);
            }
        };

        let transport = Transport::new(samples.len(), sample_rate, channels);
        let stop = Arc::new(AtomicBool::new(false));

        let (setup_tx, setup_rx) = oneshot::channel();
        {
            let samples = samples.clone();
            let transport = transport.clone();
            let stop = stop.clone();
            thread::Builder::new()
                .name("fieldnote-playback".into())
                .spawn(move || {
                    playback_thread(samples, sample_rate, channels, transport, stop, setup_tx)
                })
                .map_err(Error::Io)?;
        }
        match setup_rx.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.publish_stopped();
                return Err(e);
            }
            Err(_) => {
                self.publish_stopped();
                return Err(Error::Audio("playback thread exited during setup".into()));
            }
        }

        info!(
            subsystem = "audio",
            component = "player",
            op = "play",
            url,
            duration_ms = transport.duration().as_millis() as u64,
            "Playback started"
        );
        let _ = self.progress_tx.send(PlaybackProgress {
            state: PlaybackState::Playing,
            progress: 0.0,
            position: Duration::ZERO,
            duration: transport.duration(),
        });

        let ticker = self.spawn_ticker(transport.clone(), stop.clone(), on_complete);
        *inner = Some(Active {
            url: url.to_string(),
            transport,
            stop,
            ticker,
        });
        Ok(())
    }

    /// Stop playback, if any, and reset published progress.
    pub async fn stop(&self) {
        let mut inner = self.inner.lock().await;
        Self::halt(&mut inner);
        self.publish_stopped();
    }

    /// Map a `[0, 1]` fraction to an absolute position in the current clip.
    /// No-op while stopped.
    pub async fn seek(&self, fraction: f32) {
        let inner = self.inner.lock().await;
        if let Some(active) = inner.as_ref() {
            active.transport.seek(fraction);
            let _ = self.progress_tx.send(PlaybackProgress {
                state: PlaybackState::Playing,
                progress: active.transport.progress(),
                position: active.transport.position(),
                duration: active.transport.duration(),
            });
        }
    }

    async fn prepare(&self, url: &str) -> Result<(Arc<Vec<f32>>, u32, u16)> {
        // Staged recordings are previewed straight from disk before they
        // are uploaded, so bare paths and file:// URLs bypass HTTP.
        let bytes = if let Some(path) = url.strip_prefix("file://") {
            tokio::fs::read(path).await?
        } else if !url.contains("://") {
            tokio::fs::read(url).await?
        } else {
            let response = self.http.get(url).send().await?.error_for_status()?;
            response.bytes().await?.to_vec()
        };
        let (samples, sample_rate, channels) = decode_wav(&bytes)?;
        Ok((Arc::new(samples), sample_rate, channels))
    }

    fn spawn_ticker<F>(
        &self,
        transport: Transport,
        stop: Arc<AtomicBool>,
        on_complete: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let progress_tx = self.progress_tx.clone();
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_millis(PROGRESS_INTERVAL_MS));
            let mut on_complete = Some(on_complete);
            loop {
                interval.tick().await;
                if stop.load(Ordering::Relaxed) {
                    break;
                }
                if transport.is_finished() {
                    stop.store(true, Ordering::Relaxed);
                    let _ = progress_tx.send(PlaybackProgress::default());
                    if let Some(callback) = on_complete.take() {
                        callback();
                    }
                    break;
                }
                let _ = progress_tx.send(PlaybackProgress {
                    state: PlaybackState::Playing,
                    progress: transport.progress(),
                    position: transport.position(),
                    duration: transport.duration(),
                });
            }
        })
    }

    fn halt(inner: &mut Option<Active>) {
        if let Some(active) = inner.take() {
            active.stop.store(true, Ordering::Relaxed);
            active.ticker.abort();
        }
    }

    fn publish_stopped(&self) {
        let _ = self.progress_tx.send(PlaybackProgress::default());
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a WAV blob into interleaved f32 PCM.
fn decode_wav(bytes: &[u8]) -> Result<(Vec<f32>, u32, u16)> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| Error::Audio(format!("cannot decode audio: {}", e)))?;
    let spec = reader.spec();

    let samples: std::result::Result<Vec<f32>, hound::Error> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect(),
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect()
        }
    };
    let samples = samples.map_err(|e| Error::Audio(format!("cannot decode audio: {}", e)))?;
    Ok((samples, spec.sample_rate, spec.channels))
}

/// Body of the dedicated output thread. Owns the cpal stream; exits when
/// the clip finishes or the stop flag is raised.
fn playback_thread(
    samples: Arc<Vec<f32>>,
    sample_rate: u32,
    clip_channels: u16,
    transport: Transport,
    stop: Arc<AtomicBool>,
    setup_tx: oneshot::Sender<Result<()>>,
) {
    let host = cpal::default_host();
    let Some(device) = host.default_output_device() else {
        let _ = setup_tx.send(Err(Error::Audio("no output device available".into())));
        return;
    };
    let supported = match device.default_output_config() {
        Ok(c) => c,
        Err(e) => {
            let _ = setup_tx.send(Err(Error::Audio(format!(
                "default output config unavailable: {}",
                e
            ))));
            return;
        }
    };

    let out_channels = supported.channels() as usize;
    let config = cpal::StreamConfig {
        channels: supported.channels(),
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let clip_channels = clip_channels.max(1) as usize;
    let callback_stop = stop.clone();
    let stream = device.build_output_stream(
        &config,
        move |out: &mut [f32], _: &cpal::OutputCallbackInfo| {
            for frame in out.chunks_mut(out_channels) {
                if callback_stop.load(Ordering::Relaxed) {
                    frame.fill(0.0);
                    continue;
                }
                let idx = transport.advance(clip_channels);
                if idx + clip_channels <= samples.len() {
                    for (ch, slot) in frame.iter_mut().enumerate() {
                        // Mono clips fan out to every output channel; extra
                        // clip channels beyond the device's are dropped.
                        *slot = samples[idx + ch.min(clip_channels - 1)];
                    }
                } else {
                    frame.fill(0.0);
                }
            }
        },
        |e| warn!(subsystem = "audio", component = "player", error = %e, "output stream error"),
        None,
    );

    let stream = match stream {
        Ok(s) => s,
        Err(e) => {
            let _ = setup_tx.send(Err(Error::Audio(format!(
                "cannot open output stream: {}",
                e
            ))));
            return;
        }
    };
    if let Err(e) = stream.play() {
        let _ = setup_tx.send(Err(Error::Audio(format!("cannot start playback: {}", e))));
        return;
    }
    let _ = setup_tx.send(Ok(()));

    while !stop.load(Ordering::Relaxed) {
        thread::sleep(Duration::from_millis(50));
    }
    // Stream dropped here, releasing the device.
}
