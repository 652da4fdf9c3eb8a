//! # fieldnote-app
//!
//! Screen controllers and application wiring for fieldnote.
//!
//! Each controller orchestrates the store/media/audio/geo components for
//! one user-facing workflow and publishes observable UI state through a
//! watch channel. Failures are captured at the controller boundary and
//! rendered as an error state; nothing propagates as an uncaught fault.

pub mod config;
pub mod demo;
pub mod pin;
pub mod screens;

pub use config::AppConfig;
pub use demo::seed_demo_notes;
pub use pin::PinVault;
pub use screens::{
    AddNoteController, EditNoteController, MapController, NotesController, PinController, UiState,
};
