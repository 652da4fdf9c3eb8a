//! Add-note workflow: stage media and location, then upload and persist.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::debug;
use uuid::Uuid;

use fieldnote_audio::{Player, Recorder};
use fieldnote_core::{Error, NewNote, NoteStore, Result};
use fieldnote_geo::LocationResolver;
use fieldnote_media::MediaStore;

use super::state::UiState;

#[derive(Default)]
struct Staged {
    image_path: Option<PathBuf>,
    audio_path: Option<PathBuf>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    address: Option<String>,
}

/// Controller for the add-note screen.
///
/// Media and location are staged locally; `save` uploads whatever was
/// staged and persists the note in one sequenced action.
pub struct AddNoteController {
    store: Arc<dyn NoteStore>,
    media: Arc<MediaStore>,
    resolver: Arc<LocationResolver>,
    recorder: Arc<Recorder>,
    player: Arc<Player>,
    staging_dir: PathBuf,
    staged: Mutex<Staged>,
    state_tx: watch::Sender<UiState<Uuid>>,
}

impl AddNoteController {
    pub fn new(
        store: Arc<dyn NoteStore>,
        media: Arc<MediaStore>,
        resolver: Arc<LocationResolver>,
        recorder: Arc<Recorder>,
        player: Arc<Player>,
        staging_dir: impl Into<PathBuf>,
    ) -> Self {
        let (state_tx, _) = watch::channel(UiState::Initial);
        Self {
            store,
            media,
            resolver,
            recorder,
            player,
            staging_dir: staging_dir.into(),
            staged: Mutex::new(Staged::default()),
            state_tx,
        }
    }

    /// Observable screen state. `Success` carries the created note's id.
    pub fn state(&self) -> watch::Receiver<UiState<Uuid>> {
        self.state_tx.subscribe()
    }

    /// Reserve a temp file for the camera to write into and stage it.
    pub async fn prepare_image_capture(&self) -> Result<PathBuf> {
        let result = async {
            tokio::fs::create_dir_all(&self.staging_dir).await?;
            let path = self
                .staging_dir
                .join(format!("capture_{}.jpg", Uuid::now_v7()));
            self.staged.lock().await.image_path = Some(path.clone());
            Ok(path)
        }
        .await;

        if let Err(e) = &result {
            let _ = self
                .state_tx
                .send(UiState::Error(format!("Failed to prepare camera: {}", e)));
        }
        result
    }

    /// True while the staged recording is running.
    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    /// Start or stop the staged audio recording.
    pub async fn toggle_recording(&self) -> Result<()> {
        let result = if self.recorder.is_recording() {
            self.recorder.stop().map(|_| ())
        } else {
            match self.recorder.start() {
                Ok(path) => {
                    self.staged.lock().await.audio_path = Some(path);
                    Ok(())
                }
                Err(e) => Err(e),
            }
        };

        if let Err(e) = &result {
            let _ = self
                .state_tx
                .send(UiState::Error(format!("Recording failed: {}", e)));
        }
        result
    }

    /// Toggle preview playback of the staged recording.
    pub async fn toggle_playback(&self) -> Result<()> {
        let staged_audio = self.staged.lock().await.audio_path.clone();
        let Some(path) = staged_audio else {
            return Ok(());
        };
        self.player.play(&path.to_string_lossy(), || {}).await
    }

    /// Stage a location, resolving its address.
    pub async fn set_location(&self, latitude: f64, longitude: f64) {
        if !self.resolver.has_location_permission() {
            let _ = self
                .state_tx
                .send(UiState::Error("Location permission not granted".into()));
            return;
        }

        let address = self.resolver.address_from_coords(latitude, longitude).await;
        let mut staged = self.staged.lock().await;
        staged.latitude = Some(latitude);
        staged.longitude = Some(longitude);
        staged.address = Some(address);
    }

    /// Upload staged media and persist the note.
    ///
    /// Sequenced within this one action: uploads first, then the insert.
    pub async fn save(&self, title: &str, content: &str) -> Result<Uuid> {
        let _ = self.state_tx.send(UiState::Loading);

        let result = self.save_inner(title, content).await;
        match &result {
            Ok(id) => {
                let _ = self.state_tx.send(UiState::Success(*id));
            }
            Err(e) => {
                let _ = self.state_tx.send(UiState::Error(e.to_string()));
            }
        }
        result
    }

    async fn save_inner(&self, title: &str, content: &str) -> Result<Uuid> {
        let mut staged = self.staged.lock().await;

        let image_url = match staged.image_path.take() {
            Some(path) => Some(self.upload_file(&path, MediaTarget::Image).await?),
            None => None,
        };
        let audio_url = match staged.audio_path.take() {
            Some(path) => Some(self.upload_file(&path, MediaTarget::Audio).await?),
            None => None,
        };

        let note = NewNote {
            title: title.to_string(),
            content: content.to_string(),
            image_url,
            audio_url,
            latitude: staged.latitude.take(),
            longitude: staged.longitude.take(),
            address: staged.address.take(),
        };
        self.store.insert(note).await
    }

    async fn upload_file(&self, path: &PathBuf, target: MediaTarget) -> Result<String> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| Error::Upload(format!("cannot read {}: {}", path.display(), e)))?;
        let url = match target {
            MediaTarget::Image => self.media.upload_image(&bytes).await?,
            MediaTarget::Audio => self.media.upload_audio(&bytes).await?,
        };
        // The staged temp file is spent once uploaded.
        let _ = tokio::fs::remove_file(path).await;
        debug!(
            subsystem = "app",
            component = "add_note",
            op = "upload",
            url = %url,
            "Staged media uploaded"
        );
        Ok(url)
    }

    /// Tear the screen down: discard any running recording and stop
    /// playback.
    pub async fn close(&self) {
        let _ = self.recorder.cancel();
        self.player.stop().await;
    }
}

#[derive(Clone, Copy)]
enum MediaTarget {
    Image,
    Audio,
}
