//! # fieldnote-core
//!
//! Core types, traits, and abstractions for the fieldnote diary engine.
//!
//! This crate provides the foundational data structures and trait definitions
//! that other fieldnote crates depend on.

pub mod defaults;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod permissions;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use events::{DiaryEvent, EventBus};
pub use models::{NewNote, Note};
pub use permissions::Permissions;
pub use traits::NoteStore;
