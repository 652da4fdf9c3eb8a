//! PostgreSQL integration tests for PgNoteStore.
//!
//! These require a live database (see test_fixtures::DEFAULT_TEST_DATABASE_URL)
//! and are ignored by default. Run with:
//! `cargo test -p fieldnote-db -- --ignored`

use fieldnote_core::{Error, NewNote, NoteStore};
use fieldnote_db::test_fixtures::TestDatabase;
use uuid::Uuid;

#[tokio::test]
#[ignore]
async fn pg_insert_get_update_delete_cycle() {
    let test_db = TestDatabase::new().await;

    let id = test_db
        .store
        .insert(
            NewNote::new("Walk", "around the lake")
                .with_coordinates(54.70, 20.50)
                .with_address("Lake road, 1, Kaliningrad"),
        )
        .await
        .unwrap();

    let mut note = test_db.store.get(id).await.unwrap().expect("inserted note");
    assert_eq!(note.title, "Walk");
    assert!(note.has_location());

    note.content = "around the lake, twice".into();
    test_db.store.update(&note).await.unwrap();
    let reloaded = test_db.store.get(id).await.unwrap().unwrap();
    assert_eq!(reloaded.content, "around the lake, twice");

    test_db.store.delete(id).await.unwrap();
    assert!(test_db.store.get(id).await.unwrap().is_none());

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn pg_delete_missing_returns_not_found() {
    let test_db = TestDatabase::new().await;

    let err = test_db.store.delete(Uuid::now_v7()).await.unwrap_err();
    assert!(matches!(err, Error::NoteNotFound(_)));

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn pg_list_orders_newest_first() {
    let test_db = TestDatabase::new().await;

    test_db.store.insert(NewNote::new("a", "")).await.unwrap();
    test_db.store.insert(NewNote::new("b", "")).await.unwrap();

    let notes = test_db.store.list().await.unwrap();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].title, "b");

    test_db.cleanup().await;
}
