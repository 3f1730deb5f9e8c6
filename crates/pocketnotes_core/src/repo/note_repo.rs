//! Note repository contract and document-store implementation.
//!
//! # Invariants
//! - Notes live in the `notes` collection with body
//!   `{ ownerId, title, content }`; timestamps are store-managed.
//! - List results are ordered `updated_at DESC, id ASC`.
//! - Deleting a missing note succeeds without effect.

use crate::model::note::{Note, NoteDraft, NoteId, NoteValidationError, OwnerId};
use crate::store::{
    Document, DocumentFields, DocumentStore, Filter, LiveQuery, OrderBy, OrderField, Query,
    StoreError,
};
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

/// Collection holding note documents.
pub const NOTES_COLLECTION: &str = "notes";

const OWNER_FIELD: &str = "ownerId";
const SEARCH_FIELDS: [&str; 2] = ["title", "content"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for note use-cases.
#[derive(Debug)]
pub enum RepoError {
    Validation(NoteValidationError),
    Store(StoreError),
    NotFound(NoteId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<NoteValidationError> for RepoError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound { id, .. } => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}

/// Document body of a note.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NoteBody {
    owner_id: OwnerId,
    title: String,
    content: String,
}

/// Note intents used by the notes screen.
pub trait NoteRepository {
    /// Lists the owner's notes, most recently updated first.
    fn list_for_owner(&self, owner: OwnerId) -> RepoResult<Vec<Note>>;
    /// Lists the owner's notes whose title or content contains `text`.
    fn search_for_owner(&self, owner: OwnerId, text: &str) -> RepoResult<Vec<Note>>;
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Creates a note and returns the store-assigned id.
    fn add_note(&self, owner: OwnerId, draft: &NoteDraft) -> RepoResult<NoteId>;
    /// Replaces title and content. Last writer wins.
    fn update_note(&self, id: NoteId, draft: &NoteDraft) -> RepoResult<()>;
    fn delete_note(&self, id: NoteId) -> RepoResult<()>;
    /// Opens a live subscription over the owner's notes.
    fn subscribe_owner(&self, owner: OwnerId) -> RepoResult<NotesSubscription>;
}

/// Live view over one owner's notes.
#[derive(Debug)]
pub struct NotesSubscription {
    owner: OwnerId,
    live: LiveQuery,
}

impl NotesSubscription {
    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Drains pending changes; `true` when the owner's list must be reloaded.
    pub fn poll_changed(&mut self) -> bool {
        self.live.poll_changed()
    }

    /// Waits until the owner's list changes. `false` once the feed is gone.
    pub async fn changed(&mut self) -> bool {
        self.live.changed().await
    }
}

/// Note repository backed by any document store.
pub struct DocumentNoteRepository<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> DocumentNoteRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn run_query(&self, query: &Query) -> RepoResult<Vec<Note>> {
        self.store
            .query(NOTES_COLLECTION, query)?
            .into_iter()
            .map(document_to_note)
            .collect()
    }
}

impl<S: DocumentStore> NoteRepository for DocumentNoteRepository<S> {
    fn list_for_owner(&self, owner: OwnerId) -> RepoResult<Vec<Note>> {
        let started_at = Instant::now();
        let result = self.run_query(&owner_query(owner));
        log_outcome("note_list", started_at, &result);
        result
    }

    fn search_for_owner(&self, owner: OwnerId, text: &str) -> RepoResult<Vec<Note>> {
        let needle = text.trim();
        if needle.is_empty() {
            return self.list_for_owner(owner);
        }
        let started_at = Instant::now();
        let query = owner_query(owner).filter(Filter::contains(SEARCH_FIELDS, needle));
        let result = self.run_query(&query);
        log_outcome("note_search", started_at, &result);
        result
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        self.store
            .get(NOTES_COLLECTION, id)?
            .map(document_to_note)
            .transpose()
    }

    fn add_note(&self, owner: OwnerId, draft: &NoteDraft) -> RepoResult<NoteId> {
        let started_at = Instant::now();
        draft.validate()?;
        let body = encode_body(&NoteBody {
            owner_id: owner,
            title: draft.title.clone(),
            content: draft.content.clone(),
        })?;
        let result = self
            .store
            .insert(NOTES_COLLECTION, body)
            .map_err(RepoError::from);
        log_outcome("note_add", started_at, &result);
        result
    }

    fn update_note(&self, id: NoteId, draft: &NoteDraft) -> RepoResult<()> {
        let started_at = Instant::now();
        draft.validate()?;
        let mut fields = DocumentFields::new();
        fields.insert("title".to_string(), Value::String(draft.title.clone()));
        fields.insert("content".to_string(), Value::String(draft.content.clone()));
        let result = self
            .store
            .update(NOTES_COLLECTION, id, fields)
            .map_err(RepoError::from);
        log_outcome("note_update", started_at, &result);
        result
    }

    fn delete_note(&self, id: NoteId) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self
            .store
            .delete(NOTES_COLLECTION, id)
            .map(|_existed| ())
            .map_err(RepoError::from);
        log_outcome("note_delete", started_at, &result);
        result
    }

    fn subscribe_owner(&self, owner: OwnerId) -> RepoResult<NotesSubscription> {
        let live = self
            .store
            .subscribe(NOTES_COLLECTION, owner_query(owner))?;
        Ok(NotesSubscription { owner, live })
    }
}

fn owner_query(owner: OwnerId) -> Query {
    Query::new()
        .filter(Filter::eq(OWNER_FIELD, owner.to_string()))
        .order_by(OrderBy::desc(OrderField::UpdatedAt))
}

fn encode_body(body: &NoteBody) -> RepoResult<DocumentFields> {
    match serde_json::to_value(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(RepoError::InvalidData(
            "note body did not encode to an object".to_string(),
        )),
        Err(err) => Err(RepoError::InvalidData(format!(
            "cannot encode note body: {err}"
        ))),
    }
}

fn document_to_note(document: Document) -> RepoResult<Note> {
    let id = document.id;
    let body: NoteBody = serde_json::from_value(Value::Object(document.fields))
        .map_err(|err| RepoError::InvalidData(format!("note {id}: {err}")))?;
    Ok(Note {
        id,
        owner_id: body.owner_id,
        title: body.title,
        content: body.content,
        created_at: document.created_at,
        updated_at: document.updated_at,
    })
}

fn log_outcome<T>(event: &str, started_at: Instant, result: &RepoResult<T>) {
    match result {
        Ok(_) => info!(
            "event={event} module=repo status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event={event} module=repo status=error duration_ms={} error={}",
            started_at.elapsed().as_millis(),
            err
        ),
    }
}

/// Parses a note id coming from the UI layer.
pub fn parse_note_id(value: &str) -> RepoResult<NoteId> {
    Uuid::parse_str(value.trim())
        .map_err(|_| RepoError::InvalidData(format!("invalid note id `{value}`")))
}
