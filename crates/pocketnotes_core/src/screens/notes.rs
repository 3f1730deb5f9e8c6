//! Notes list with a compose/edit modal.
//!
//! ```text
//! Viewing --open-add--> Composing --save ok / cancel--> Viewing
//! Viewing --open-edit--> Editing --save ok / cancel--> Viewing
//! ```
//!
//! Delete runs from any mode through a confirmation dialog and leaves the
//! mode unchanged.

use super::{Dialog, Effect};
use crate::model::note::{Note, NoteDraft, NoteId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotesMode {
    Viewing,
    Composing,
    Editing(Note),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotesMsg {
    Mounted,
    OpenAdd,
    OpenEdit(NoteId),
    TitleChanged(String),
    ContentChanged(String),
    Save,
    Cancel,
    RequestDelete(NoteId),
    ConfirmDelete,
    CancelDelete,
    SearchChanged(String),
    NotesLoaded(Vec<Note>),
    LoadFailed(String),
    SaveSucceeded,
    SaveFailed(String),
    DeleteSucceeded,
    DeleteFailed(String),
    Logout,
}

/// Home screen state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesScreen {
    pub owner_email: String,
    /// Last loaded list, newest update first, already filtered by `search`.
    pub notes: Vec<Note>,
    pub mode: NotesMode,
    pub title: String,
    pub content: String,
    /// Note awaiting delete confirmation.
    pub pending_delete: Option<NoteId>,
    /// Filter applied by the store on every load.
    pub search: String,
    pub loading: bool,
    pub saving: bool,
}

impl NotesScreen {
    /// Initial state: viewing an empty list.
    pub fn new(owner_email: impl Into<String>) -> Self {
        Self {
            owner_email: owner_email.into(),
            notes: Vec::new(),
            mode: NotesMode::Viewing,
            title: String::new(),
            content: String::new(),
            pending_delete: None,
            search: String::new(),
            loading: false,
            saving: false,
        }
    }

    pub fn modal_visible(&self) -> bool {
        !matches!(self.mode, NotesMode::Viewing)
    }

    pub fn update(&mut self, msg: NotesMsg) -> Vec<Effect> {
        match msg {
            NotesMsg::Mounted => vec![self.load()],
            NotesMsg::OpenAdd => {
                self.fill_form("", "");
                self.mode = NotesMode::Composing;
                Vec::new()
            }
            NotesMsg::OpenEdit(id) => {
                if let Some(note) = self.notes.iter().find(|note| note.id == id).cloned() {
                    self.fill_form(&note.title, &note.content);
                    self.mode = NotesMode::Editing(note);
                }
                Vec::new()
            }
            NotesMsg::TitleChanged(value) => {
                self.title = value;
                Vec::new()
            }
            NotesMsg::ContentChanged(value) => {
                self.content = value;
                Vec::new()
            }
            NotesMsg::Save => self.save(),
            NotesMsg::Cancel => {
                if !self.saving {
                    self.close_modal();
                }
                Vec::new()
            }
            NotesMsg::RequestDelete(id) => {
                // Only notes in the loaded list belong to this owner.
                if !self.notes.iter().any(|note| note.id == id) {
                    return Vec::new();
                }
                self.pending_delete = Some(id);
                vec![Effect::ShowDialog(Dialog::confirm_delete_note())]
            }
            NotesMsg::ConfirmDelete => match self.pending_delete.take() {
                Some(id) => vec![Effect::DeleteNote { id }],
                None => Vec::new(),
            },
            NotesMsg::CancelDelete => {
                self.pending_delete = None;
                Vec::new()
            }
            NotesMsg::SearchChanged(text) => {
                if text == self.search {
                    return Vec::new();
                }
                self.search = text;
                vec![self.load()]
            }
            NotesMsg::NotesLoaded(notes) => {
                self.loading = false;
                self.notes = notes;
                Vec::new()
            }
            NotesMsg::LoadFailed(_) => {
                self.loading = false;
                vec![Effect::ShowDialog(Dialog::alert(
                    "Error",
                    "Failed to load notes",
                ))]
            }
            NotesMsg::SaveSucceeded => {
                self.saving = false;
                self.close_modal();
                vec![self.load()]
            }
            NotesMsg::SaveFailed(_) => {
                self.saving = false;
                vec![Effect::ShowDialog(Dialog::alert(
                    "Error",
                    "Failed to save note",
                ))]
            }
            NotesMsg::DeleteSucceeded => vec![self.load()],
            NotesMsg::DeleteFailed(_) => vec![Effect::ShowDialog(Dialog::alert(
                "Error",
                "Failed to delete note",
            ))],
            NotesMsg::Logout => vec![Effect::Logout],
        }
    }

    fn save(&mut self) -> Vec<Effect> {
        if self.saving {
            return Vec::new();
        }
        let draft = NoteDraft::new(self.title.trim(), self.content.trim());
        if draft.validate().is_err() {
            return vec![Effect::ShowDialog(Dialog::alert(
                "Error",
                "Please fill in both title and content",
            ))];
        }

        let effect = match &self.mode {
            NotesMode::Viewing => return Vec::new(),
            NotesMode::Composing => Effect::AddNote {
                title: draft.title,
                content: draft.content,
            },
            NotesMode::Editing(note) => Effect::UpdateNote {
                id: note.id,
                title: draft.title,
                content: draft.content,
            },
        };
        self.saving = true;
        vec![effect]
    }

    fn load(&mut self) -> Effect {
        self.loading = true;
        Effect::LoadNotes {
            search: self.search.clone(),
        }
    }

    fn fill_form(&mut self, title: &str, content: &str) {
        self.title = title.to_string();
        self.content = content.to_string();
    }

    fn close_modal(&mut self) {
        self.mode = NotesMode::Viewing;
        self.fill_form("", "");
    }
}
