//! Document store collaborator.
//!
//! # Responsibility
//! - Persist schemaless JSON documents grouped by collection.
//! - Answer equality/substring predicate queries with one ordering field.
//! - Push change notifications to live queries.
//!
//! # Invariants
//! - Document ids are assigned by the store and never reused.
//! - `created_at` is written once; `updated_at` strictly increases per write.
//! - Every successful mutation publishes exactly one `DocumentChange`.

pub mod document;
pub mod live;
pub mod query;
pub mod sqlite_store;

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use document::{Document, DocumentFields, DocumentId};
pub use live::{ChangeFeed, ChangeKind, DocumentChange, LiveQuery, DEFAULT_FEED_CAPACITY};
pub use query::{Filter, OrderBy, OrderField, Query, SortDirection};
pub use sqlite_store::{DocumentStore, SqliteDocumentStore};

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-layer failure.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    NotFound {
        collection: String,
        id: DocumentId,
    },
    /// Collection or field name outside `[A-Za-z_][A-Za-z0-9_]*`.
    InvalidName(String),
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { collection, id } => {
                write!(f, "document not found: {collection}/{id}")
            }
            Self::InvalidName(name) => write!(f, "invalid collection or field name: `{name}`"),
            Self::InvalidData(message) => write!(f, "invalid stored document: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
