//! Notes-list workflow: live list plus delete.

use std::sync::Arc;

use tokio::sync::watch;
use uuid::Uuid;

use fieldnote_core::{EventBus, Note, NoteStore, Result};
use fieldnote_db::{watch_notes, NoteFeed};
use fieldnote_geo::GeofenceRegistrar;

use super::state::UiState;

/// Controller for the notes-list screen.
///
/// The list itself comes from the shared live feed; deletes surface store
/// failures as an error state and drop the note's geofence on success.
pub struct NotesController {
    store: Arc<dyn NoteStore>,
    registrar: Arc<GeofenceRegistrar>,
    feed: NoteFeed,
    state_tx: watch::Sender<UiState<()>>,
}

impl NotesController {
    pub fn new(
        store: Arc<dyn NoteStore>,
        registrar: Arc<GeofenceRegistrar>,
        bus: &EventBus,
    ) -> Self {
        let feed = watch_notes(store.clone(), bus);
        let (state_tx, _) = watch::channel(UiState::Initial);
        Self {
            store,
            registrar,
            feed,
            state_tx,
        }
    }

    /// Observable screen state for mutations.
    pub fn state(&self) -> watch::Receiver<UiState<()>> {
        self.state_tx.subscribe()
    }

    /// Live note list, newest first. Errors degrade to an empty list.
    pub fn notes(&self) -> watch::Receiver<Vec<Note>> {
        self.feed.subscribe()
    }

    /// Fetch one note; absence is `Ok(None)`.
    pub async fn get(&self, id: Uuid) -> Result<Option<Note>> {
        self.store.get(id).await
    }

    /// Delete a note, removing its geofence on success.
    pub async fn delete(&self, id: Uuid) {
        let _ = self.state_tx.send(UiState::Loading);
        match self.store.delete(id).await {
            Ok(()) => {
                self.registrar.remove(id).await;
                let _ = self.state_tx.send(UiState::Success(()));
            }
            Err(e) => {
                let _ = self.state_tx.send(UiState::Error(e.to_string()));
            }
        }
    }

    /// Tear the screen down, detaching the live feed.
    pub fn close(self) {
        self.feed.close();
    }
}
