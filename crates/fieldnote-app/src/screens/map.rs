//! Map workflow: the live note list projected to located pins.

use std::sync::Arc;

use tokio::sync::watch;

use fieldnote_core::{EventBus, Note, NoteStore};
use fieldnote_db::{watch_notes, NoteFeed};

/// Controller for the map screen. Read-only over the shared live feed.
pub struct MapController {
    feed: NoteFeed,
}

impl MapController {
    pub fn new(store: Arc<dyn NoteStore>, bus: &EventBus) -> Self {
        Self {
            feed: watch_notes(store, bus),
        }
    }

    /// Live note list, newest first.
    pub fn notes(&self) -> watch::Receiver<Vec<Note>> {
        self.feed.subscribe()
    }

    /// Notes that can be pinned: both coordinates present.
    pub fn located_notes(&self) -> Vec<Note> {
        self.feed
            .current()
            .into_iter()
            .filter(Note::has_location)
            .collect()
    }

    /// Tear the screen down, detaching the live feed.
    pub fn close(self) {
        self.feed.close();
    }
}
