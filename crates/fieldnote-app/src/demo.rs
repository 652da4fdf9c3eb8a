//! Demo data seeding for first start.

use tracing::info;

use fieldnote_core::{NewNote, NoteStore, Result};

/// Seed a few demo notes when the store is empty.
///
/// Returns the number of notes inserted (zero when the store already has
/// content).
pub async fn seed_demo_notes(store: &dyn NoteStore) -> Result<usize> {
    if !store.list().await?.is_empty() {
        return Ok(0);
    }

    let demo_notes = vec![
        NewNote::new("Demo Note 1", "Hello from note #1").with_coordinates(54.70, 20.50),
        NewNote::new("Demo Note 2", "Sample with no location"),
        NewNote::new("Demo Note 3", "Has location as well").with_coordinates(54.69, 20.46),
    ];

    let count = demo_notes.len();
    for note in demo_notes {
        store.insert(note).await?;
    }

    info!(
        subsystem = "app",
        component = "demo",
        result_count = count,
        "Seeded demo notes"
    );
    Ok(count)
}
