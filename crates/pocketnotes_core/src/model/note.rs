//! Note domain model.
//!
//! # Invariants
//! - `id` is assigned by the document store and never changes.
//! - `created_at` is set once; `updated_at` only grows.
//! - `title` and `content` are non-empty after trimming.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Store-assigned note identifier.
pub type NoteId = Uuid;

/// Notes are scoped to the identity collaborator's user id.
pub type OwnerId = UserId;

/// Persisted note as seen by the app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub owner_id: OwnerId,
    pub title: String,
    pub content: String,
    /// Unix epoch milliseconds, set by the store at insert.
    pub created_at: i64,
    /// Unix epoch milliseconds, bumped by the store on every edit.
    pub updated_at: i64,
}

/// Title/content pair submitted by the compose/edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Validates draft invariants before any store call.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.title.trim().is_empty() {
            return Err(NoteValidationError::EmptyTitle);
        }
        if self.content.trim().is_empty() {
            return Err(NoteValidationError::EmptyContent);
        }
        Ok(())
    }
}

/// Draft validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteValidationError {
    EmptyTitle,
    EmptyContent,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "note title must not be empty"),
            Self::EmptyContent => write!(f, "note content must not be empty"),
        }
    }
}

impl Error for NoteValidationError {}
