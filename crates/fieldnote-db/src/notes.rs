//! Note store implementation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

use fieldnote_core::{DiaryEvent, Error, EventBus, NewNote, Note, NoteStore, Result};

/// Run the embedded schema migrations against the given pool.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| Error::Database(e.into()))?;
    Ok(())
}

/// PostgreSQL implementation of [`NoteStore`].
///
/// Every successful mutation emits a [`DiaryEvent`] on the shared bus so
/// live feeds refresh without polling.
pub struct PgNoteStore {
    pool: PgPool,
    bus: Arc<EventBus>,
}

impl PgNoteStore {
    /// Create a new PgNoteStore with the given connection pool and bus.
    pub fn new(pool: PgPool, bus: Arc<EventBus>) -> Self {
        Self { pool, bus }
    }

    /// The event bus mutations are announced on.
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    fn note_from_row(row: &sqlx::postgres::PgRow) -> Note {
        Note {
            id: row.get("id"),
            title: row.get("title"),
            content: row.get("content"),
            image_url: row.get("image_url"),
            audio_url: row.get("audio_url"),
            latitude: row.get("latitude"),
            longitude: row.get("longitude"),
            address: row.get("address"),
            created_at: row.get("created_at"),
        }
    }
}

const NOTE_COLUMNS: &str =
    "id, title, content, image_url, audio_url, latitude, longitude, address, created_at";

#[async_trait]
impl NoteStore for PgNoteStore {
    async fn list(&self) -> Result<Vec<Note>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM note ORDER BY created_at DESC, id DESC",
            NOTE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "note_store",
            op = "list",
            result_count = rows.len(),
            "Listed notes"
        );
        Ok(rows.iter().map(Self::note_from_row).collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Note>> {
        let row = sqlx::query(&format!("SELECT {} FROM note WHERE id = $1", NOTE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.as_ref().map(Self::note_from_row))
    }

    async fn insert(&self, note: NewNote) -> Result<Uuid> {
        let note_id = Uuid::now_v7();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO note (id, title, content, image_url, audio_url, latitude, longitude, address, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(note_id)
        .bind(&note.title)
        .bind(&note.content)
        .bind(&note.image_url)
        .bind(&note.audio_url)
        .bind(note.latitude)
        .bind(note.longitude)
        .bind(&note.address)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "note_store",
            op = "insert",
            note_id = %note_id,
            "Note created"
        );
        self.bus.emit(DiaryEvent::NoteCreated { note_id });
        Ok(note_id)
    }

    async fn update(&self, note: &Note) -> Result<()> {
        if note.id.is_nil() {
            return Err(Error::InvalidInput("note id is empty".into()));
        }

        // Full-row overwrite: last writer wins, matching the document-store
        // semantics the rest of the system assumes.
        let result = sqlx::query(
            "UPDATE note
             SET title = $2, content = $3, image_url = $4, audio_url = $5,
                 latitude = $6, longitude = $7, address = $8
             WHERE id = $1",
        )
        .bind(note.id)
        .bind(&note.title)
        .bind(&note.content)
        .bind(&note.image_url)
        .bind(&note.audio_url)
        .bind(note.latitude)
        .bind(note.longitude)
        .bind(&note.address)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NoteNotFound(note.id));
        }

        self.bus.emit(DiaryEvent::NoteUpdated { note_id: note.id });
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM note WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NoteNotFound(id));
        }

        self.bus.emit(DiaryEvent::NoteDeleted { note_id: id });
        Ok(())
    }
}
