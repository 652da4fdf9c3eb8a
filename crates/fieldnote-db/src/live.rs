//! Live note feed: a cancellable push stream of the full note list.
//!
//! The feed subscribes to the shared [`EventBus`] and re-reads the store
//! whenever a note mutation is announced. Consumers hold a cheap watch
//! receiver; the underlying bus listener is detached when the feed is
//! closed (or dropped), so no callback can outlive its screen.

use std::sync::Arc;

use tokio::sync::{broadcast::error::RecvError, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use fieldnote_core::{EventBus, Note, NoteStore};

/// Handle to a running live note feed.
///
/// Dropping the handle (or calling [`NoteFeed::close`]) aborts the refresh
/// task, which detaches the bus listener.
pub struct NoteFeed {
    rx: watch::Receiver<Vec<Note>>,
    task: JoinHandle<()>,
}

impl NoteFeed {
    /// A receiver over list snapshots. Clone freely; every observer sees
    /// the same shared read-only feed.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Note>> {
        self.rx.clone()
    }

    /// Current snapshot of the note list.
    pub fn current(&self) -> Vec<Note> {
        self.rx.borrow().clone()
    }

    /// Stop the feed and detach its bus listener.
    pub fn close(self) {
        self.task.abort();
    }
}

impl Drop for NoteFeed {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start a live feed of the full note list.
///
/// The initial snapshot is read immediately; afterwards the feed refreshes
/// on every note-list-changing event. Store errors degrade to an empty
/// list rather than tearing the feed down — freshness recovers on the next
/// successful read.
pub fn watch_notes(store: Arc<dyn NoteStore>, bus: &EventBus) -> NoteFeed {
    let mut events = bus.subscribe();
    let (tx, rx) = watch::channel(Vec::new());

    let task = tokio::spawn(async move {
        send_snapshot(&*store, &tx).await;

        loop {
            match events.recv().await {
                Ok(event) if event.changes_note_list() => {
                    send_snapshot(&*store, &tx).await;
                }
                Ok(_) => {}
                // Fell behind the bus buffer: the store is re-read anyway,
                // so a full refresh catches us up.
                Err(RecvError::Lagged(skipped)) => {
                    debug!(
                        subsystem = "db",
                        component = "live_feed",
                        skipped,
                        "Feed lagged behind event bus, refreshing"
                    );
                    send_snapshot(&*store, &tx).await;
                }
                Err(RecvError::Closed) => break,
            }

            if tx.is_closed() {
                break;
            }
        }
    });

    NoteFeed { rx, task }
}

async fn send_snapshot(store: &dyn NoteStore, tx: &watch::Sender<Vec<Note>>) {
    let notes = match store.list().await {
        Ok(notes) => notes,
        Err(e) => {
            warn!(
                subsystem = "db",
                component = "live_feed",
                error = %e,
                "Note list read failed, degrading to empty snapshot"
            );
            Vec::new()
        }
    };
    let _ = tx.send(notes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::MemoryNoteStore;
    use fieldnote_core::NewNote;

    #[tokio::test]
    async fn test_feed_delivers_initial_snapshot() {
        let bus = Arc::new(EventBus::new(32));
        let store = Arc::new(MemoryNoteStore::new(bus.clone()));
        store.insert(NewNote::new("first", "")).await.unwrap();

        let feed = watch_notes(store.clone(), &bus);
        let mut rx = feed.subscribe();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_feed_refreshes_on_mutation() {
        let bus = Arc::new(EventBus::new(32));
        let store = Arc::new(MemoryNoteStore::new(bus.clone()));

        let feed = watch_notes(store.clone(), &bus);
        let mut rx = feed.subscribe();
        rx.changed().await.unwrap(); // initial (empty)

        let id = store.insert(NewNote::new("added", "")).await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().len(), 1);

        store.delete(id).await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_close_detaches_listener() {
        let bus = Arc::new(EventBus::new(32));
        let store = Arc::new(MemoryNoteStore::new(bus.clone()));

        let feed = watch_notes(store.clone(), &bus);
        // Initial snapshot lands before we close.
        let mut rx = feed.subscribe();
        rx.changed().await.unwrap();

        feed.close();

        // The aborted task drops its bus receiver; eventually no
        // subscribers remain.
        for _ in 0..100 {
            if bus.subscriber_count() == 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
        assert_eq!(bus.subscriber_count(), 0);
    }
}
