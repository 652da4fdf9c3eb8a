//! Microphone capture: Idle → Recording → Idle.
//!
//! At most one recording session exists per process. The cpal input stream
//! is owned by a dedicated thread (streams are not `Send`); the thread
//! writes 16-bit WAV through hound, meters amplitude on a fixed cadence,
//! and exits on a stop signal. Session state lives in the recorder and is
//! returned to callers rather than queried as ambient state.

use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use hound::WavWriter;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use fieldnote_core::defaults::{AMPLITUDE_INTERVAL_MS, AMPLITUDE_WINDOW, RECORDING_TICK_MS};
use fieldnote_core::{Error, Permissions, Result};

use crate::level::{mean_amplitude, AmplitudeRing};

/// How long to wait for the capture thread to acquire the device.
const SETUP_TIMEOUT: Duration = Duration::from_secs(5);

type SharedWriter = Arc<Mutex<Option<WavWriter<std::io::BufWriter<std::fs::File>>>>>;

/// Capture session state, returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureState {
    /// No active session.
    Idle,
    /// Recording into the given temp file.
    Recording { path: PathBuf },
}

struct ActiveSession {
    path: PathBuf,
    stop_tx: mpsc::SyncSender<()>,
    thread: thread::JoinHandle<Result<()>>,
}

/// Microphone recorder with live amplitude metering.
///
/// `start` is a no-op returning the existing session's file path when a
/// recording is already active. `stop` finalizes the WAV; `cancel`
/// additionally discards the temp file. Device resources are released on
/// every exit path.
pub struct Recorder {
    permissions: Permissions,
    cache_dir: PathBuf,
    session: Mutex<Option<ActiveSession>>,
    levels_tx: watch::Sender<Vec<f32>>,
    elapsed_tx: watch::Sender<Duration>,
}

impl Recorder {
    /// Create a recorder writing temp files under the app cache directory.
    pub fn new(permissions: Permissions) -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("fieldnote")
            .join("recordings");
        Self::with_cache_dir(permissions, cache_dir)
    }

    /// Create a recorder writing temp files under the given directory.
    pub fn with_cache_dir(permissions: Permissions, cache_dir: impl Into<PathBuf>) -> Self {
        let (levels_tx, _) = watch::channel(vec![0.0; AMPLITUDE_WINDOW]);
        let (elapsed_tx, _) = watch::channel(Duration::ZERO);
        Self {
            permissions,
            cache_dir: cache_dir.into(),
            session: Mutex::new(None),
            levels_tx,
            elapsed_tx,
        }
    }

    /// Rolling window of the most recent normalized amplitude samples,
    /// oldest first. Exactly [`AMPLITUDE_WINDOW`] entries in `[0, 1]`.
    pub fn amplitudes(&self) -> watch::Receiver<Vec<f32>> {
        self.levels_tx.subscribe()
    }

    /// Elapsed recording time, updated about once per second.
    pub fn elapsed(&self) -> watch::Receiver<Duration> {
        self.elapsed_tx.subscribe()
    }

    /// Current session state.
    pub fn state(&self) -> CaptureState {
        match self.session.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
            Some(active) => CaptureState::Recording {
                path: active.path.clone(),
            },
            None => CaptureState::Idle,
        }
    }

    /// True while a recording session is active.
    pub fn is_recording(&self) -> bool {
        matches!(self.state(), CaptureState::Recording { .. })
    }

    /// Start recording, returning the temp file path.
    ///
    /// No-op when already recording: the existing session's path is
    /// returned and no second session is created. Microphone acquisition
    /// failure (permission or hardware) surfaces as an error with no side
    /// effects.
    pub fn start(&self) -> Result<PathBuf> {
        let mut session = self.session.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(active) = session.as_ref() {
            debug!(
                subsystem = "audio",
                component = "recorder",
                op = "start_recording",
                "Recording already active, returning existing session"
            );
            return Ok(active.path.clone());
        }

        if !self.permissions.microphone {
            return Err(Error::PermissionDenied("microphone".into()));
        }

        std::fs::create_dir_all(&self.cache_dir)?;
        let path = self
            .cache_dir
            .join(format!("recording_{}.wav", Uuid::now_v7()));

        let (stop_tx, stop_rx) = mpsc::sync_channel(1);
        let (setup_tx, setup_rx) = mpsc::sync_channel(1);
        let levels_tx = self.levels_tx.clone();
        let elapsed_tx = self.elapsed_tx.clone();
        let thread_path = path.clone();

        let thread = thread::Builder::new()
            .name("fieldnote-capture".into())
            .spawn(move || capture_thread(thread_path, stop_rx, setup_tx, levels_tx, elapsed_tx))
            .map_err(Error::Io)?;

        // Wait for the thread to acquire the device so acquisition failures
        // surface to the caller instead of a dead session.
        match setup_rx.recv_timeout(SETUP_TIMEOUT) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = thread.join();
                let _ = std::fs::remove_file(&path);
                return Err(e);
            }
            Err(_) => {
                let _ = stop_tx.send(());
                let _ = thread.join();
                let _ = std::fs::remove_file(&path);
                return Err(Error::Audio("timed out acquiring input device".into()));
            }
        }

        info!(
            subsystem = "audio",
            component = "recorder",
            op = "start_recording",
            path = %path.display(),
            "Recording started"
        );
        *session = Some(ActiveSession {
            path: path.clone(),
            stop_tx,
            thread,
        });
        Ok(path)
    }

    /// Stop recording and finalize the WAV file.
    ///
    /// Returns the finished file's path, or `None` when no recording was
    /// active. Metering and the elapsed clock reset to zero either way.
    pub fn stop(&self) -> Result<Option<PathBuf>> {
        let taken = self
            .session
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        let Some(active) = taken else {
            return Ok(None);
        };

        let _ = active.stop_tx.send(());
        let joined = active
            .thread
            .join()
            .map_err(|_| Error::Audio("capture thread panicked".into()));

        // Cleanup happens regardless of how the session ended.
        let _ = self.levels_tx.send(vec![0.0; AMPLITUDE_WINDOW]);
        let _ = self.elapsed_tx.send(Duration::ZERO);

        joined??;
        info!(
            subsystem = "audio",
            component = "recorder",
            op = "stop_recording",
            path = %active.path.display(),
            "Recording finished"
        );
        Ok(Some(active.path))
    }

    /// Stop recording and discard the temp file.
    pub fn cancel(&self) -> Result<()> {
        if let Some(path) = self.stop()? {
            let _ = std::fs::remove_file(&path);
            debug!(
                subsystem = "audio",
                component = "recorder",
                op = "cancel_recording",
                path = %path.display(),
                "Recording cancelled, temp file discarded"
            );
        }
        Ok(())
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if let Some(active) = self
            .session
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            let _ = active.stop_tx.send(());
        }
    }
}

/// Body of the dedicated capture thread.
///
/// Owns the cpal stream and the WAV writer; meters amplitude every
/// [`AMPLITUDE_INTERVAL_MS`] until the stop signal arrives, then finalizes
/// the file.
fn capture_thread(
    path: PathBuf,
    stop_rx: mpsc::Receiver<()>,
    setup_tx: mpsc::SyncSender<Result<()>>,
    levels_tx: watch::Sender<Vec<f32>>,
    elapsed_tx: watch::Sender<Duration>,
) -> Result<()> {
    let host = cpal::default_host();
    let Some(device) = host.default_input_device() else {
        let _ = setup_tx.send(Err(Error::Audio("no input device available".into())));
        return Ok(());
    };
    let supported = match device.default_input_config() {
        Ok(c) => c,
        Err(e) => {
            let _ = setup_tx.send(Err(Error::Audio(format!(
                "default input config unavailable: {}",
                e
            ))));
            return Ok(());
        }
    };

    let spec = hound::WavSpec {
        channels: supported.channels(),
        sample_rate: supported.sample_rate().0,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let writer: SharedWriter = match WavWriter::create(&path, spec) {
        Ok(w) => Arc::new(Mutex::new(Some(w))),
        Err(e) => {
            let _ = setup_tx.send(Err(Error::Audio(format!("cannot create wav file: {}", e))));
            return Ok(());
        }
    };

    // Float PCM accumulated since the last metering tick.
    let chunk: Arc<Mutex<Vec<f32>>> = Arc::new(Mutex::new(Vec::new()));

    let stream = match build_input_stream(&device, &supported, writer.clone(), chunk.clone()) {
        Ok(s) => s,
        Err(e) => {
            let _ = setup_tx.send(Err(e));
            let _ = std::fs::remove_file(&path);
            return Ok(());
        }
    };
    if let Err(e) = stream.play() {
        let _ = setup_tx.send(Err(Error::Audio(format!("cannot start stream: {}", e))));
        let _ = std::fs::remove_file(&path);
        return Ok(());
    }
    let _ = setup_tx.send(Ok(()));

    let started = Instant::now();
    let mut ring = AmplitudeRing::new(AMPLITUDE_WINDOW);
    let mut last_elapsed_emit = Duration::ZERO;
    loop {
        match stop_rx.recv_timeout(Duration::from_millis(AMPLITUDE_INTERVAL_MS)) {
            Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                let samples = {
                    let mut chunk = chunk.lock().unwrap_or_else(|e| e.into_inner());
                    std::mem::take(&mut *chunk)
                };
                ring.push(mean_amplitude(&samples));
                let _ = levels_tx.send(ring.snapshot());

                let elapsed = started.elapsed();
                if elapsed - last_elapsed_emit >= Duration::from_millis(RECORDING_TICK_MS) {
                    last_elapsed_emit = elapsed;
                    let _ = elapsed_tx.send(elapsed);
                }
            }
        }
    }

    drop(stream);
    let finalized = writer
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .take()
        .map(|w| w.finalize());
    match finalized {
        Some(Ok(())) => Ok(()),
        Some(Err(e)) => Err(Error::Audio(format!("cannot finalize wav file: {}", e))),
        None => Ok(()),
    }
}

fn build_input_stream(
    device: &cpal::Device,
    supported: &cpal::SupportedStreamConfig,
    writer: SharedWriter,
    chunk: Arc<Mutex<Vec<f32>>>,
) -> Result<cpal::Stream> {
    let config: cpal::StreamConfig = supported.config();
    let err_fn = |e| warn!(subsystem = "audio", component = "recorder", error = %e, "input stream error");

    let stream = match supported.sample_format() {
        cpal::SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _: &_| write_input(data, &writer, &chunk),
            err_fn,
            None,
        ),
        cpal::SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _: &_| write_input(data, &writer, &chunk),
            err_fn,
            None,
        ),
        cpal::SampleFormat::U16 => device.build_input_stream(
            &config,
            move |data: &[u16], _: &_| write_input(data, &writer, &chunk),
            err_fn,
            None,
        ),
        other => {
            return Err(Error::Audio(format!(
                "unsupported input sample format: {:?}",
                other
            )))
        }
    };
    stream.map_err(|e| Error::Audio(format!("cannot open input stream: {}", e)))
}

fn write_input<T>(data: &[T], writer: &SharedWriter, chunk: &Arc<Mutex<Vec<f32>>>)
where
    T: Sample + SizedSample,
    i16: FromSample<T>,
    f32: FromSample<T>,
{
    let mut chunk = chunk.lock().unwrap_or_else(|e| e.into_inner());
    let mut writer = writer.lock().unwrap_or_else(|e| e.into_inner());
    for &sample in data {
        chunk.push(f32::from_sample(sample));
        if let Some(w) = writer.as_mut() {
            let _ = w.write_sample(i16::from_sample(sample));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn test_recorder(permissions: Permissions) -> (Recorder, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        (Recorder::with_cache_dir(permissions, dir.path()), dir)
    }

    /// Install a session backed by a stub thread so lifecycle tests run
    /// without audio hardware.
    fn install_fake_session(recorder: &Recorder, path: &Path) {
        let (stop_tx, stop_rx) = mpsc::sync_channel(1);
        let thread = thread::spawn(move || {
            let _ = stop_rx.recv();
            Ok(())
        });
        *recorder.session.lock().unwrap() = Some(ActiveSession {
            path: path.to_path_buf(),
            stop_tx,
            thread,
        });
    }

    #[test]
    fn test_starts_idle() {
        let (recorder, _dir) = test_recorder(Permissions::all());
        assert_eq!(recorder.state(), CaptureState::Idle);
        assert!(!recorder.is_recording());
    }

    #[test]
    fn test_start_without_microphone_permission_has_no_side_effects() {
        let (recorder, dir) = test_recorder(Permissions::none());
        let err = recorder.start().unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
        assert_eq!(recorder.state(), CaptureState::Idle);
        // No temp file was created.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_second_start_returns_existing_session_path() {
        let (recorder, dir) = test_recorder(Permissions::all());
        let path = dir.path().join("active.wav");
        install_fake_session(&recorder, &path);

        let returned = recorder.start().unwrap();
        assert_eq!(returned, path);
        assert!(recorder.is_recording());

        // Still exactly one session.
        assert_eq!(
            recorder.state(),
            CaptureState::Recording { path: path.clone() }
        );
        assert_eq!(recorder.stop().unwrap(), Some(path));
    }

    #[test]
    fn test_stop_when_idle_is_noop() {
        let (recorder, _dir) = test_recorder(Permissions::all());
        assert_eq!(recorder.stop().unwrap(), None);
        recorder.cancel().unwrap();
    }

    #[test]
    fn test_stop_resets_meter_and_clock() {
        let (recorder, dir) = test_recorder(Permissions::all());
        let path = dir.path().join("active.wav");
        install_fake_session(&recorder, &path);

        let levels = recorder.amplitudes();
        let elapsed = recorder.elapsed();
        recorder.stop().unwrap();

        assert!(levels.borrow().iter().all(|&v| v == 0.0));
        assert_eq!(levels.borrow().len(), AMPLITUDE_WINDOW);
        assert_eq!(*elapsed.borrow(), Duration::ZERO);
        assert_eq!(recorder.state(), CaptureState::Idle);
    }

    #[test]
    fn test_cancel_discards_temp_file() {
        let (recorder, dir) = test_recorder(Permissions::all());
        let path = dir.path().join("doomed.wav");
        std::fs::write(&path, b"riff").unwrap();
        install_fake_session(&recorder, &path);

        recorder.cancel().unwrap();
        assert!(!path.exists());
        assert_eq!(recorder.state(), CaptureState::Idle);
    }
}
