//! Edit-note workflow: load, mutate in place, re-record audio, save.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use uuid::Uuid;

use fieldnote_audio::{format_time, PlaybackProgress, Player, Recorder};
use fieldnote_core::{Error, Note, NoteStore, Result};
use fieldnote_geo::{GeofenceRegistrar, LocationResolver};
use fieldnote_media::MediaStore;

use super::state::UiState;

/// Controller for the edit-note screen.
///
/// Holds the note being edited; field updates mutate the copy and
/// re-publish `Success`, while `save` persists it and reconciles the
/// note's geofence.
pub struct EditNoteController {
    store: Arc<dyn NoteStore>,
    media: Arc<MediaStore>,
    registrar: Arc<GeofenceRegistrar>,
    resolver: Arc<LocationResolver>,
    recorder: Arc<Recorder>,
    player: Arc<Player>,
    current: Mutex<Option<Note>>,
    state_tx: watch::Sender<UiState<Note>>,
}

impl EditNoteController {
    pub fn new(
        store: Arc<dyn NoteStore>,
        media: Arc<MediaStore>,
        registrar: Arc<GeofenceRegistrar>,
        resolver: Arc<LocationResolver>,
        recorder: Arc<Recorder>,
        player: Arc<Player>,
    ) -> Self {
        let (state_tx, _) = watch::channel(UiState::Initial);
        Self {
            store,
            media,
            registrar,
            resolver,
            recorder,
            player,
            current: Mutex::new(None),
            state_tx,
        }
    }

    /// Observable screen state; `Success` carries the current note copy.
    pub fn state(&self) -> watch::Receiver<UiState<Note>> {
        self.state_tx.subscribe()
    }

    /// Live amplitude window while recording.
    pub fn recording_amplitudes(&self) -> watch::Receiver<Vec<f32>> {
        self.recorder.amplitudes()
    }

    /// Elapsed recording time.
    pub fn recording_time(&self) -> watch::Receiver<Duration> {
        self.recorder.elapsed()
    }

    /// Playback progress for the note's recording.
    pub fn audio_progress(&self) -> watch::Receiver<PlaybackProgress> {
        self.player.progress()
    }

    /// Render a position as `MM:SS`.
    pub fn format_time(&self, millis: u64) -> String {
        format_time(millis)
    }

    /// Load the note to edit.
    pub async fn load(&self, id: Uuid) {
        let _ = self.state_tx.send(UiState::Loading);
        match self.store.get(id).await {
            Ok(Some(note)) => {
                *self.current.lock().await = Some(note.clone());
                let _ = self.state_tx.send(UiState::Success(note));
            }
            Ok(None) => {
                let _ = self.state_tx.send(UiState::Error("Note not found".into()));
            }
            Err(e) => {
                let _ = self.state_tx.send(UiState::Error(e.to_string()));
            }
        }
    }

    /// Update the title on the local copy.
    pub async fn update_title(&self, title: &str) {
        self.mutate(|note| note.title = title.to_string()).await;
    }

    /// Update the body on the local copy.
    pub async fn update_content(&self, content: &str) {
        self.mutate(|note| note.content = content.to_string()).await;
    }

    /// Pull the last known device location into the local copy.
    pub async fn update_location(&self) {
        if !self.resolver.has_location_permission() {
            let _ = self
                .state_tx
                .send(UiState::Error("No location permission!".into()));
            return;
        }
        let Some(fix) = self.resolver.last_known_location().await else {
            let _ = self
                .state_tx
                .send(UiState::Error("Could not get location".into()));
            return;
        };
        let address = self
            .resolver
            .address_from_coords(fix.latitude, fix.longitude)
            .await;
        self.mutate(|note| {
            note.latitude = Some(fix.latitude);
            note.longitude = Some(fix.longitude);
            note.address = Some(address);
        })
        .await;
    }

    /// Toggle playback of the note's recording, if it has one.
    pub async fn toggle_playback(&self) -> Result<()> {
        let audio_url = self
            .current
            .lock()
            .await
            .as_ref()
            .and_then(|n| n.audio_url.clone());
        let Some(url) = audio_url else {
            return Ok(());
        };
        self.player.play(&url, || {}).await
    }

    /// Map a `[0, 1]` fraction onto the playing recording.
    pub async fn seek(&self, position: f32) {
        self.player.seek(position).await;
    }

    /// Start re-recording the note's audio.
    pub fn start_recording(&self) {
        if let Err(e) = self.recorder.start() {
            let message = match e {
                Error::PermissionDenied(_) => "Recording permission not granted".to_string(),
                other => format!("Failed to start recording: {}", other),
            };
            let _ = self.state_tx.send(UiState::Error(message));
        }
    }

    /// Stop recording, upload the result, and persist the new audio URL.
    pub async fn stop_recording(&self) {
        let finished = match self.recorder.stop() {
            Ok(Some(path)) => path,
            Ok(None) => return,
            Err(e) => {
                let _ = self
                    .state_tx
                    .send(UiState::Error(format!("Failed to stop recording: {}", e)));
                return;
            }
        };

        let result: Result<()> = async {
            let bytes = tokio::fs::read(&finished).await?;
            let audio_url = self.media.upload_audio(&bytes).await?;
            let _ = tokio::fs::remove_file(&finished).await;

            let mut current = self.current.lock().await;
            if let Some(note) = current.as_mut() {
                note.audio_url = Some(audio_url);
                self.store.update(note).await?;
                let _ = self.state_tx.send(UiState::Success(note.clone()));
            }
            Ok(())
        }
        .await;

        if let Err(e) = result {
            let _ = self
                .state_tx
                .send(UiState::Error(format!("Failed to upload audio: {}", e)));
        }
    }

    /// Discard an in-flight recording.
    pub fn cancel_recording(&self) {
        let _ = self.recorder.cancel();
    }

    /// Upload a photo and attach it to the local copy.
    pub async fn add_photo(&self, bytes: &[u8]) {
        match self.media.upload_image(bytes).await {
            Ok(image_url) => {
                self.mutate(|note| note.image_url = Some(image_url)).await;
            }
            Err(e) => {
                let _ = self
                    .state_tx
                    .send(UiState::Error(format!("Failed to upload image: {}", e)));
            }
        }
    }

    /// Persist the local copy and reconcile the note's geofence: register
    /// when it has a location, remove otherwise.
    pub async fn save(&self) {
        let note = match self.current.lock().await.clone() {
            Some(note) => note,
            None => return,
        };

        match self.store.update(&note).await {
            Ok(()) => {
                if note.has_location() {
                    self.registrar.add_for_note(&note).await;
                } else {
                    self.registrar.remove(note.id).await;
                }
                let _ = self.state_tx.send(UiState::Success(note));
            }
            Err(e) => {
                let _ = self
                    .state_tx
                    .send(UiState::Error(format!("Failed to save: {}", e)));
            }
        }
    }

    /// True iff location permission is granted.
    pub fn has_permission(&self) -> bool {
        self.resolver.has_location_permission()
    }

    /// Tear the screen down: release the recorder and the player.
    pub async fn close(&self) {
        let _ = self.recorder.cancel();
        self.player.stop().await;
    }

    async fn mutate(&self, apply: impl FnOnce(&mut Note)) {
        let mut current = self.current.lock().await;
        if let Some(note) = current.as_mut() {
            apply(note);
            let _ = self.state_tx.send(UiState::Success(note.clone()));
        }
    }
}
