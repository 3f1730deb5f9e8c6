use pocketnotes_core::db::open_db_in_memory;
use pocketnotes_core::store::{
    ChangeFeed, DocumentFields, DocumentStore, Filter, OrderBy, OrderField, Query,
    SqliteDocumentStore, StoreError,
};
use serde_json::{json, Value};
use uuid::Uuid;

fn fields(value: Value) -> DocumentFields {
    value.as_object().cloned().unwrap()
}

#[test]
fn insert_assigns_id_and_timestamps() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn, ChangeFeed::default());

    let id = store
        .insert("notes", fields(json!({"title": "a", "n": 1})))
        .unwrap();
    let doc = store.get("notes", id).unwrap().unwrap();
    assert_eq!(doc.id, id);
    assert_eq!(doc.collection, "notes");
    assert_eq!(doc.str_field("title"), Some("a"));
    assert_eq!(doc.created_at, doc.updated_at);
    assert!(doc.created_at > 0);
}

#[test]
fn collections_are_isolated() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn, ChangeFeed::default());

    let id = store.insert("notes", fields(json!({"k": "v"}))).unwrap();
    assert!(store.get("users", id).unwrap().is_none());
    assert!(store.query("users", &Query::new()).unwrap().is_empty());
}

#[test]
fn update_merges_fields_and_strictly_bumps_updated_at() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn, ChangeFeed::default());
    let id = store
        .insert("notes", fields(json!({"title": "a", "keep": true})))
        .unwrap();
    let before = store.get("notes", id).unwrap().unwrap();

    store
        .update("notes", id, fields(json!({"title": "b"})))
        .unwrap();
    store
        .update("notes", id, fields(json!({"title": "c"})))
        .unwrap();

    let after = store.get("notes", id).unwrap().unwrap();
    assert_eq!(after.str_field("title"), Some("c"));
    assert_eq!(after.fields.get("keep"), Some(&Value::Bool(true)));
    assert_eq!(after.created_at, before.created_at);
    assert!(after.updated_at >= before.updated_at + 2);
}

#[test]
fn update_missing_document_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn, ChangeFeed::default());

    let err = store
        .update("notes", Uuid::new_v4(), fields(json!({"title": "x"})))
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[test]
fn delete_reports_whether_document_existed() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn, ChangeFeed::default());
    let id = store.insert("notes", fields(json!({"a": 1}))).unwrap();

    assert!(store.delete("notes", id).unwrap());
    assert!(!store.delete("notes", id).unwrap());
    assert!(store.get("notes", id).unwrap().is_none());
}

#[test]
fn query_applies_typed_equality_filters() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn, ChangeFeed::default());
    store
        .insert("items", fields(json!({"owner": "1", "flag": true})))
        .unwrap();
    store
        .insert("items", fields(json!({"owner": 1, "flag": false})))
        .unwrap();
    store.insert("items", fields(json!({"flag": 1}))).unwrap();

    let by_text = store
        .query("items", &Query::new().filter(Filter::eq("owner", "1")))
        .unwrap();
    assert_eq!(by_text.len(), 1);
    assert_eq!(by_text[0].fields.get("flag"), Some(&Value::Bool(true)));

    let by_number = store
        .query("items", &Query::new().filter(Filter::eq("owner", 1)))
        .unwrap();
    assert_eq!(by_number.len(), 1);

    let by_bool = store
        .query("items", &Query::new().filter(Filter::eq("flag", true)))
        .unwrap();
    assert_eq!(by_bool.len(), 1);

    let missing_owner = store
        .query("items", &Query::new().filter(Filter::eq("owner", Value::Null)))
        .unwrap();
    assert_eq!(missing_owner.len(), 1);
}

#[test]
fn query_contains_matches_any_field_ignoring_case() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn, ChangeFeed::default());
    store
        .insert("notes", fields(json!({"title": "Camping", "content": "tent"})))
        .unwrap();
    store
        .insert("notes", fields(json!({"title": "Work", "content": "Camp meeting"})))
        .unwrap();
    store
        .insert("notes", fields(json!({"title": "Other", "content": "nothing"})))
        .unwrap();

    let hits = store
        .query(
            "notes",
            &Query::new().filter(Filter::contains(["title", "content"], "CAMP")),
        )
        .unwrap();
    assert_eq!(hits.len(), 2);
}

#[test]
fn query_orders_by_requested_field_then_id() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn, ChangeFeed::default());
    for rank in [2, 3, 1] {
        store.insert("items", fields(json!({"rank": rank}))).unwrap();
    }

    let ranks = |docs: Vec<pocketnotes_core::store::Document>| {
        docs.iter()
            .map(|doc| doc.fields["rank"].as_i64().unwrap())
            .collect::<Vec<_>>()
    };

    let asc = store
        .query(
            "items",
            &Query::new().order_by(OrderBy::asc(OrderField::Field("rank".to_string()))),
        )
        .unwrap();
    assert_eq!(ranks(asc), vec![1, 2, 3]);

    let desc = store
        .query(
            "items",
            &Query::new().order_by(OrderBy::desc(OrderField::Field("rank".to_string()))),
        )
        .unwrap();
    assert_eq!(ranks(desc), vec![3, 2, 1]);
}

#[test]
fn query_orders_by_updated_at_descending() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn, ChangeFeed::default());
    let first = store.insert("notes", fields(json!({"t": "first"}))).unwrap();
    let second = store.insert("notes", fields(json!({"t": "second"}))).unwrap();

    conn.execute(
        "UPDATE documents SET updated_at = 1000 WHERE id = ?1;",
        [second.to_string()],
    )
    .unwrap();
    conn.execute(
        "UPDATE documents SET updated_at = 2000 WHERE id = ?1;",
        [first.to_string()],
    )
    .unwrap();

    let listed = store
        .query(
            "notes",
            &Query::new().order_by(OrderBy::desc(OrderField::UpdatedAt)),
        )
        .unwrap();
    assert_eq!(
        listed.iter().map(|doc| doc.id).collect::<Vec<_>>(),
        vec![first, second]
    );
}

#[test]
fn invalid_names_are_rejected_before_sql() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn, ChangeFeed::default());

    let err = store
        .insert("notes", fields(json!({"bad.key": 1})))
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidName(_)));

    let err = store.query("no tes", &Query::new()).unwrap_err();
    assert!(matches!(err, StoreError::InvalidName(_)));
}

#[test]
fn live_query_sees_writes_that_enter_or_leave_its_result() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn, ChangeFeed::default());
    let alice = Query::new().filter(Filter::eq("owner", "alice"));
    let mut live = store.subscribe("notes", alice.clone()).unwrap();

    let bob_note = store
        .insert("notes", fields(json!({"owner": "bob"})))
        .unwrap();
    assert!(!live.poll_changed());

    store
        .update("notes", bob_note, fields(json!({"owner": "alice"})))
        .unwrap();
    assert!(live.poll_changed());
    assert_eq!(store.query("notes", &alice).unwrap().len(), 1);

    store
        .update("notes", bob_note, fields(json!({"owner": "bob"})))
        .unwrap();
    assert!(live.poll_changed());
    assert!(store.query("notes", &alice).unwrap().is_empty());

    store.delete("notes", bob_note).unwrap();
    assert!(!live.poll_changed());
}

#[tokio::test]
async fn live_query_changed_wakes_on_relevant_insert() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn, ChangeFeed::default());
    let alice = Query::new().filter(Filter::eq("owner", "alice"));
    let mut live = store.subscribe("notes", alice.clone()).unwrap();

    store
        .insert("notes", fields(json!({"owner": "bob"})))
        .unwrap();
    store
        .insert("notes", fields(json!({"owner": "alice"})))
        .unwrap();

    let woke = tokio::time::timeout(std::time::Duration::from_secs(1), live.changed())
        .await
        .unwrap();
    assert!(woke);
    assert_eq!(store.query("notes", &alice).unwrap().len(), 1);
}
