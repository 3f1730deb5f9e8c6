use pocketnotes_core::db::open_db_in_memory;
use pocketnotes_core::{
    ChangeFeed, DocumentNoteRepository, NoteDraft, NoteRepository, NoteValidationError,
    RepoError, SqliteDocumentStore,
};
use rusqlite::Connection;
use uuid::Uuid;

fn repo(conn: &Connection, feed: ChangeFeed) -> DocumentNoteRepository<SqliteDocumentStore<'_>> {
    DocumentNoteRepository::new(SqliteDocumentStore::new(conn, feed))
}

fn set_updated_at(conn: &Connection, id: Uuid, updated_at: i64) {
    conn.execute(
        "UPDATE documents SET updated_at = ?1 WHERE id = ?2;",
        rusqlite::params![updated_at, id.to_string()],
    )
    .unwrap();
}

#[test]
fn add_then_list_returns_note_with_store_timestamps() {
    let conn = open_db_in_memory().unwrap();
    let repo = repo(&conn, ChangeFeed::default());
    let owner = Uuid::new_v4();

    let id = repo
        .add_note(owner, &NoteDraft::new("Groceries", "milk, eggs"))
        .unwrap();
    let notes = repo.list_for_owner(owner).unwrap();

    assert_eq!(notes.len(), 1);
    let note = &notes[0];
    assert_eq!(note.id, id);
    assert_eq!(note.owner_id, owner);
    assert_eq!(note.title, "Groceries");
    assert_eq!(note.content, "milk, eggs");
    assert_eq!(note.created_at, note.updated_at);
}

#[test]
fn add_rejects_blank_fields_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let repo = repo(&conn, ChangeFeed::default());
    let owner = Uuid::new_v4();

    let err = repo
        .add_note(owner, &NoteDraft::new("   ", "body"))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(NoteValidationError::EmptyTitle)
    ));
    let err = repo
        .add_note(owner, &NoteDraft::new("title", "\n"))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(NoteValidationError::EmptyContent)
    ));
    assert!(repo.list_for_owner(owner).unwrap().is_empty());
}

#[test]
fn update_replaces_text_and_keeps_identity_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = repo(&conn, ChangeFeed::default());
    let owner = Uuid::new_v4();
    let id = repo.add_note(owner, &NoteDraft::new("a", "b")).unwrap();
    let before = repo.get_note(id).unwrap().unwrap();

    repo.update_note(id, &NoteDraft::new("a2", "b2")).unwrap();

    let after = repo.get_note(id).unwrap().unwrap();
    assert_eq!(after.title, "a2");
    assert_eq!(after.content, "b2");
    assert_eq!(after.id, before.id);
    assert_eq!(after.owner_id, before.owner_id);
    assert_eq!(after.created_at, before.created_at);
    assert!(after.updated_at > before.updated_at);
}

#[test]
fn update_missing_note_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = repo(&conn, ChangeFeed::default());
    let missing = Uuid::new_v4();

    let err = repo
        .update_note(missing, &NoteDraft::new("a", "b"))
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == missing));
}

#[test]
fn delete_removes_note_and_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let repo = repo(&conn, ChangeFeed::default());
    let owner = Uuid::new_v4();
    let id = repo.add_note(owner, &NoteDraft::new("a", "b")).unwrap();

    repo.delete_note(id).unwrap();
    assert!(repo.list_for_owner(owner).unwrap().is_empty());
    assert!(repo.get_note(id).unwrap().is_none());

    repo.delete_note(id).unwrap();
    repo.delete_note(Uuid::new_v4()).unwrap();
}

#[test]
fn list_only_returns_the_owners_notes() {
    let conn = open_db_in_memory().unwrap();
    let repo = repo(&conn, ChangeFeed::default());
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    repo.add_note(alice, &NoteDraft::new("alice", "1")).unwrap();
    repo.add_note(bob, &NoteDraft::new("bob", "1")).unwrap();
    repo.add_note(bob, &NoteDraft::new("bob", "2")).unwrap();

    let alice_notes = repo.list_for_owner(alice).unwrap();
    assert_eq!(alice_notes.len(), 1);
    assert!(alice_notes.iter().all(|note| note.owner_id == alice));

    let bob_notes = repo.list_for_owner(bob).unwrap();
    assert_eq!(bob_notes.len(), 2);
    assert!(bob_notes.iter().all(|note| note.owner_id == bob));

    assert!(repo.list_for_owner(Uuid::new_v4()).unwrap().is_empty());
}

#[test]
fn list_orders_by_most_recent_update_first() {
    let conn = open_db_in_memory().unwrap();
    let repo = repo(&conn, ChangeFeed::default());
    let owner = Uuid::new_v4();
    let older = repo.add_note(owner, &NoteDraft::new("older", "x")).unwrap();
    let newer = repo.add_note(owner, &NoteDraft::new("newer", "x")).unwrap();
    set_updated_at(&conn, older, 1_000);
    set_updated_at(&conn, newer, 2_000);

    let titles = |repo: &DocumentNoteRepository<SqliteDocumentStore<'_>>| {
        repo.list_for_owner(owner)
            .unwrap()
            .into_iter()
            .map(|note| note.title)
            .collect::<Vec<_>>()
    };
    assert_eq!(titles(&repo), vec!["newer", "older"]);

    repo.update_note(older, &NoteDraft::new("older", "edited"))
        .unwrap();
    assert_eq!(titles(&repo), vec!["older", "newer"]);
}

#[test]
fn search_matches_title_or_content_ignoring_case() {
    let conn = open_db_in_memory().unwrap();
    let repo = repo(&conn, ChangeFeed::default());
    let owner = Uuid::new_v4();
    let other = Uuid::new_v4();
    repo.add_note(owner, &NoteDraft::new("Camping trip", "tent"))
        .unwrap();
    repo.add_note(owner, &NoteDraft::new("Work", "buy CAMPING stove"))
        .unwrap();
    repo.add_note(owner, &NoteDraft::new("Misc", "nothing here"))
        .unwrap();
    repo.add_note(other, &NoteDraft::new("camping", "not mine"))
        .unwrap();

    let hits = repo.search_for_owner(owner, "camping").unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|note| note.owner_id == owner));

    assert_eq!(repo.search_for_owner(owner, "  ").unwrap().len(), 3);
    assert!(repo.search_for_owner(owner, "absent").unwrap().is_empty());
}

#[test]
fn subscription_reports_only_the_owners_changes() {
    let conn = open_db_in_memory().unwrap();
    let feed = ChangeFeed::default();
    let repo = repo(&conn, feed.clone());
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let mut subscription = repo.subscribe_owner(alice).unwrap();
    assert_eq!(subscription.owner(), alice);

    // A second writer sharing the same feed.
    let writer = DocumentNoteRepository::new(SqliteDocumentStore::new(&conn, feed));
    writer.add_note(bob, &NoteDraft::new("bob", "x")).unwrap();
    assert!(!subscription.poll_changed());

    let id = writer.add_note(alice, &NoteDraft::new("alice", "x")).unwrap();
    assert!(subscription.poll_changed());
    let fresh = repo.list_for_owner(alice).unwrap();
    assert_eq!(fresh.len(), 1);
    assert_eq!(fresh[0].id, id);

    writer.delete_note(id).unwrap();
    assert!(subscription.poll_changed());
    assert!(!subscription.poll_changed());
}

#[tokio::test]
async fn subscription_changed_resolves_after_remote_add() {
    let conn = open_db_in_memory().unwrap();
    let feed = ChangeFeed::default();
    let repo = repo(&conn, feed);
    let owner = Uuid::new_v4();
    let mut subscription = repo.subscribe_owner(owner).unwrap();

    repo.add_note(owner, &NoteDraft::new("a", "b")).unwrap();

    let changed = tokio::time::timeout(
        std::time::Duration::from_secs(1),
        subscription.changed(),
    )
    .await
    .unwrap();
    assert!(changed);
}

#[test]
fn parse_note_id_rejects_garbage() {
    let id = Uuid::new_v4();
    assert_eq!(
        pocketnotes_core::repo::note_repo::parse_note_id(&format!(" {id} ")).unwrap(),
        id
    );
    assert!(matches!(
        pocketnotes_core::repo::note_repo::parse_note_id("nope"),
        Err(RepoError::InvalidData(_))
    ));
}
