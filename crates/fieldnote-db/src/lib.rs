//! # fieldnote-db
//!
//! PostgreSQL storage layer for fieldnote.
//!
//! This crate provides:
//! - Connection pool management
//! - The [`PgNoteStore`] implementation of [`fieldnote_core::NoteStore`]
//! - A cancellable live note feed ([`watch_notes`])
//! - Schema migrations
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fieldnote_core::{EventBus, NewNote, NoteStore};
//! use fieldnote_db::{create_pool, run_migrations, PgNoteStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool("postgres://localhost/fieldnote").await?;
//!     run_migrations(&pool).await?;
//!
//!     let bus = Arc::new(EventBus::default());
//!     let store = PgNoteStore::new(pool, bus);
//!     let id = store.insert(NewNote::new("First entry", "Hello")).await?;
//!     println!("Created note: {}", id);
//!     Ok(())
//! }
//! ```

pub mod live;
pub mod notes;
pub mod pool;

// Test fixtures for integration tests.
// Always compiled so consumers' tests can use MemoryNoteStore and the
// default test database URL.
pub mod test_fixtures;

// Re-export core types
pub use fieldnote_core::*;

pub use live::{watch_notes, NoteFeed};
pub use notes::{run_migrations, PgNoteStore};
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
