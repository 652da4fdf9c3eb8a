//! Screen controllers: one per user-facing workflow.
//!
//! Each controller is a small state machine over [`UiState`], published
//! through a watch channel. Async operations move to `Loading` before any
//! work starts and to `Success`/`Error` on completion. Background work is
//! owned by the controller and torn down on `close()`.

mod add;
mod edit;
mod map;
mod notes;
mod pin;
mod state;

pub use add::AddNoteController;
pub use edit::EditNoteController;
pub use map::MapController;
pub use notes::NotesController;
pub use pin::PinController;
pub use state::UiState;
