//! Diary event types and event bus for store-change notifications.
//!
//! Provides a unified event system that aggregates events from multiple
//! sources (note store writes, geofence transitions) into a single broadcast
//! channel. Downstream consumers (live note feeds, notification posting,
//! telemetry) subscribe independently.

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Unified diary event emitted on the shared bus.
///
/// Serialized as JSON with a `type` tag field, e.g.:
/// `{"type":"NoteCreated","note_id":"..."}`
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum DiaryEvent {
    /// A note was created.
    NoteCreated { note_id: Uuid },
    /// A note was overwritten in place.
    NoteUpdated { note_id: Uuid },
    /// A note was deleted.
    NoteDeleted { note_id: Uuid },
    /// A registered geofence was entered for the first time.
    GeofenceEntered { note_id: Uuid },
}

impl DiaryEvent {
    /// Returns the event type name (used for filtering and logs).
    pub fn event_type(&self) -> &'static str {
        match self {
            DiaryEvent::NoteCreated { .. } => "NoteCreated",
            DiaryEvent::NoteUpdated { .. } => "NoteUpdated",
            DiaryEvent::NoteDeleted { .. } => "NoteDeleted",
            DiaryEvent::GeofenceEntered { .. } => "GeofenceEntered",
        }
    }

    /// The note this event relates to.
    pub fn note_id(&self) -> Uuid {
        match self {
            DiaryEvent::NoteCreated { note_id }
            | DiaryEvent::NoteUpdated { note_id }
            | DiaryEvent::NoteDeleted { note_id }
            | DiaryEvent::GeofenceEntered { note_id } => *note_id,
        }
    }

    /// True for events that change the persisted note list.
    pub fn changes_note_list(&self) -> bool {
        !matches!(self, DiaryEvent::GeofenceEntered { .. })
    }
}

/// Broadcast-based event bus for distributing diary events to multiple
/// consumers.
///
/// Uses `tokio::sync::broadcast` with a configurable buffer size. Slow
/// receivers that fall behind will receive a `Lagged` error and miss events;
/// live feeds recover by re-reading the store on the next event.
pub struct EventBus {
    tx: broadcast::Sender<DiaryEvent>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    ///
    /// Recommended: 256 for production, 32 for tests.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all subscribers.
    ///
    /// If there are no active subscribers, the event is silently dropped.
    pub fn emit(&self, event: DiaryEvent) {
        tracing::debug!(
            event_type = event.event_type(),
            note_id = %event.note_id(),
            subscriber_count = self.tx.receiver_count(),
            "EventBus emit"
        );
        let _ = self.tx.send(event);
    }

    /// Subscribe to receive events. Each subscriber gets its own independent
    /// stream.
    pub fn subscribe(&self) -> broadcast::Receiver<DiaryEvent> {
        self.tx.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::defaults::EVENT_BUS_CAPACITY)
    }
}
