//! # fieldnote-media
//!
//! Media blob storage for fieldnote: uploads captured photo/audio blobs
//! through a pluggable [`StorageBackend`] and returns durable download
//! URLs for embedding in notes.
//!
//! ## Example
//!
//! ```rust,ignore
//! use fieldnote_media::{FilesystemBackend, MediaStore};
//!
//! let backend = FilesystemBackend::new("/var/fieldnote/media");
//! let store = MediaStore::new(backend, "https://media.example.com");
//!
//! let url = store.upload_image(&photo_bytes).await?;
//! ```

pub mod backend;
pub mod store;

pub use backend::{FilesystemBackend, StorageBackend};
pub use store::{compute_content_hash, MediaKind, MediaStore};
