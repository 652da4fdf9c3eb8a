//! Core traits for fieldnote abstractions.
//!
//! These traits define the interfaces that concrete implementations must
//! satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{NewNote, Note};

/// Store for note CRUD operations.
///
/// Absence is a normal outcome for reads (`get` returns `Ok(None)`); writes
/// return explicit failure results so callers can surface user-visible
/// errors without crashing. Implementations emit [`crate::DiaryEvent`]s
/// after every successful mutation so live feeds can refresh.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// List all notes, newest first.
    async fn list(&self) -> Result<Vec<Note>>;

    /// Fetch one note by id. Absent notes are `Ok(None)`, not an error.
    async fn get(&self, id: Uuid) -> Result<Option<Note>>;

    /// Insert a new note, assigning its id. Returns the assigned id.
    async fn insert(&self, note: NewNote) -> Result<Uuid>;

    /// Overwrite a note in place by id (last writer wins).
    ///
    /// Fails with `InvalidInput` for a nil id and `NotFound` when the row
    /// does not exist.
    async fn update(&self, note: &Note) -> Result<()>;

    /// Delete a note by id. Deleting an absent id is a `NotFound` failure
    /// result, not a crash.
    async fn delete(&self, id: Uuid) -> Result<()>;
}
