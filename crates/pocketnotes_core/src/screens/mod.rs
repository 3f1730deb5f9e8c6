//! Screen state records and pure update functions.
//!
//! # Responsibility
//! - Hold per-screen form input and loaded data.
//! - Turn user intents into `Effect`s without touching collaborators.
//!
//! # Invariants
//! - `update` functions never perform I/O; the app controller executes
//!   every returned effect and feeds results back as messages.

pub mod auth;
pub mod navigation;
pub mod notes;

use crate::model::note::NoteId;
use navigation::Route;
use serde::Serialize;

/// Modal dialog requested by a screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dialog {
    pub title: String,
    pub message: String,
    pub kind: DialogKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum DialogKind {
    /// Single dismiss button.
    Alert,
    /// Confirm/cancel pair; the answer is sent back as a screen message.
    Confirm {
        confirm_label: String,
        cancel_label: String,
        destructive: bool,
    },
}

impl Dialog {
    pub fn alert(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind: DialogKind::Alert,
        }
    }

    pub fn confirm_delete_note() -> Self {
        Self {
            title: "Delete Note".to_string(),
            message: "Are you sure you want to delete this note?".to_string(),
            kind: DialogKind::Confirm {
                confirm_label: "Delete".to_string(),
                cancel_label: "Cancel".to_string(),
                destructive: true,
            },
        }
    }
}

/// Navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavAction {
    Push(Route),
    Replace(Route),
    Back,
}

/// Side effect requested by a screen update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Login { email: String, password: String },
    Register { email: String, password: String },
    Logout,
    /// Reload the owner's notes; a blank `search` lists everything.
    LoadNotes { search: String },
    AddNote { title: String, content: String },
    UpdateNote {
        id: NoteId,
        title: String,
        content: String,
    },
    DeleteNote { id: NoteId },
    ShowDialog(Dialog),
    Navigate(NavAction),
}
