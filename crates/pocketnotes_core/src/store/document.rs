//! Stored document shape.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{StoreError, StoreResult};

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid name regex"));

/// Store-assigned document identifier.
pub type DocumentId = Uuid;

/// Top-level JSON object of a document.
pub type DocumentFields = Map<String, Value>;

/// One document as read back from a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub collection: String,
    pub id: DocumentId,
    pub fields: DocumentFields,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds.
    pub updated_at: i64,
}

impl Document {
    /// Returns a string field, if present and a JSON string.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

/// Rejects names that cannot be used as a collection or JSON path segment.
pub(crate) fn check_name(name: &str) -> StoreResult<()> {
    if NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}

pub(crate) fn check_field_names(fields: &DocumentFields) -> StoreResult<()> {
    fields.keys().try_for_each(|key| check_name(key))
}
