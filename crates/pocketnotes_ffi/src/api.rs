//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the login, register and notes flows to Dart via FRB.
//! - Hold one `App` per process and render it into a flat `UiSnapshot`.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every screen call returns a fresh snapshot; failures land in
//!   `UiSnapshot::message` instead of being thrown.

use log::{info, warn};
use pocketnotes_core::repo::note_repo::parse_note_id;
use pocketnotes_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    App, AppConfig, Dialog, DialogKind, LoginMsg, Note, NotesMode, NotesMsg, RegisterMsg, Route,
    UiEvent,
};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

const DEFAULT_DB_FILE_NAME: &str = "pocketnotes.sqlite3";
const APP_NOT_OPEN: &str = "app is not open; call app_open first";

static APP: Mutex<Option<App>> = Mutex::new(None);

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One note row as rendered by the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteItem {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

/// One open dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogItem {
    pub title: String,
    pub message: String,
    /// `alert|confirm`.
    pub kind: String,
    pub confirm_label: Option<String>,
    pub cancel_label: Option<String>,
    pub destructive: bool,
}

/// Everything the UI shell needs to draw the current route.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UiSnapshot {
    /// `login|register|home`; empty when the app is not open.
    pub route: String,
    pub owner_email: Option<String>,
    pub notes: Vec<NoteItem>,
    /// `viewing|composing|editing` while on home.
    pub notes_mode: String,
    pub editing_note_id: Option<String>,
    pub form_title: String,
    pub form_content: String,
    pub search: String,
    pub busy: bool,
    /// Open dialogs, oldest first.
    pub dialogs: Vec<DialogItem>,
    /// Empty on success; otherwise why the call did nothing.
    pub message: String,
}

impl UiSnapshot {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }
}

/// Opens (or reopens) the app on a SQLite file.
///
/// Input semantics:
/// - `db_path`: database file; empty uses `POCKETNOTES_DB_PATH` or a file in
///   the temp directory.
/// - `config_toml`: optional TOML overriding config defaults; may be empty.
///
/// # FFI contract
/// - Replaces any previously opened app and its session.
/// - Never panics; open failures are reported in `message`.
#[flutter_rust_bridge::frb(sync)]
pub fn app_open(db_path: String, config_toml: String) -> UiSnapshot {
    let config = match build_config(db_path.trim(), config_toml.trim()) {
        Ok(config) => config,
        Err(err) => return UiSnapshot::failure(format!("app_open failed: {err}")),
    };
    let app = match App::open(&config) {
        Ok(app) => app,
        Err(err) => return UiSnapshot::failure(format!("app_open failed: {err}")),
    };

    let mut guard = lock_app();
    let snapshot = render(&app);
    *guard = Some(app);
    info!("event=ffi_app_open module=ffi status=ok");
    snapshot
}

/// Returns the current snapshot without changing anything.
#[flutter_rust_bridge::frb(sync)]
pub fn app_snapshot() -> UiSnapshot {
    with_app(|_| Ok(()))
}

/// Submits the login form.
#[flutter_rust_bridge::frb(sync)]
pub fn auth_login(email: String, password: String) -> UiSnapshot {
    with_app(|app| {
        app.dispatch(UiEvent::Login(LoginMsg::EmailChanged(email)));
        app.dispatch(UiEvent::Login(LoginMsg::PasswordChanged(password)));
        app.dispatch(UiEvent::Login(LoginMsg::Submit));
        Ok(())
    })
}

/// Navigates from login to the register form.
#[flutter_rust_bridge::frb(sync)]
pub fn auth_open_register() -> UiSnapshot {
    with_app(|app| {
        app.dispatch(UiEvent::Login(LoginMsg::OpenRegister));
        Ok(())
    })
}

/// Submits the register form.
#[flutter_rust_bridge::frb(sync)]
pub fn auth_register(email: String, password: String) -> UiSnapshot {
    with_app(|app| {
        app.dispatch(UiEvent::Register(RegisterMsg::EmailChanged(email)));
        app.dispatch(UiEvent::Register(RegisterMsg::PasswordChanged(password)));
        app.dispatch(UiEvent::Register(RegisterMsg::Submit));
        Ok(())
    })
}

/// Leaves the register form.
#[flutter_rust_bridge::frb(sync)]
pub fn auth_back_to_login() -> UiSnapshot {
    with_app(|app| {
        app.dispatch(UiEvent::Register(RegisterMsg::BackToLogin));
        Ok(())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn auth_logout() -> UiSnapshot {
    notes_event(NotesMsg::Logout)
}

#[flutter_rust_bridge::frb(sync)]
pub fn notes_open_add() -> UiSnapshot {
    notes_event(NotesMsg::OpenAdd)
}

#[flutter_rust_bridge::frb(sync)]
pub fn notes_open_edit(note_id: String) -> UiSnapshot {
    with_app(|app| {
        let id = parse_note_id(&note_id).map_err(|err| err.to_string())?;
        app.dispatch(UiEvent::Notes(NotesMsg::OpenEdit(id)));
        Ok(())
    })
}

/// Saves the open modal with the given form values.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_save(title: String, content: String) -> UiSnapshot {
    with_app(|app| {
        app.dispatch(UiEvent::Notes(NotesMsg::TitleChanged(title)));
        app.dispatch(UiEvent::Notes(NotesMsg::ContentChanged(content)));
        app.dispatch(UiEvent::Notes(NotesMsg::Save));
        Ok(())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn notes_cancel() -> UiSnapshot {
    notes_event(NotesMsg::Cancel)
}

/// Asks for delete confirmation; answer with `notes_confirm_delete` or
/// `notes_cancel_delete`.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_request_delete(note_id: String) -> UiSnapshot {
    with_app(|app| {
        let id = parse_note_id(&note_id).map_err(|err| err.to_string())?;
        app.dispatch(UiEvent::Notes(NotesMsg::RequestDelete(id)));
        Ok(())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn notes_confirm_delete() -> UiSnapshot {
    notes_event(NotesMsg::ConfirmDelete)
}

#[flutter_rust_bridge::frb(sync)]
pub fn notes_cancel_delete() -> UiSnapshot {
    notes_event(NotesMsg::CancelDelete)
}

#[flutter_rust_bridge::frb(sync)]
pub fn notes_search(text: String) -> UiSnapshot {
    notes_event(NotesMsg::SearchChanged(text))
}

/// Applies pending live-subscription changes.
///
/// # FFI contract
/// - Sync call, non-blocking; intended for a UI-side polling tick.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_refresh() -> UiSnapshot {
    with_app(|app| {
        app.pump_subscription();
        Ok(())
    })
}

/// Closes the oldest open alert.
#[flutter_rust_bridge::frb(sync)]
pub fn dialog_dismiss() -> UiSnapshot {
    with_app(|app| {
        app.dispatch(UiEvent::DismissDialog);
        Ok(())
    })
}

fn notes_event(msg: NotesMsg) -> UiSnapshot {
    with_app(|app| {
        app.dispatch(UiEvent::Notes(msg));
        Ok(())
    })
}

fn with_app(f: impl FnOnce(&mut App) -> Result<(), String>) -> UiSnapshot {
    let mut guard = lock_app();
    let Some(app) = guard.as_mut() else {
        return UiSnapshot::failure(APP_NOT_OPEN);
    };
    let outcome = f(app);
    let mut snapshot = render(app);
    if let Err(message) = outcome {
        warn!("event=ffi_call module=ffi status=error error={message}");
        snapshot.message = message;
    }
    snapshot
}

fn lock_app() -> MutexGuard<'static, Option<App>> {
    APP.lock().unwrap_or_else(|poisoned| {
        warn!("event=ffi_lock module=ffi status=recovered reason=poisoned");
        poisoned.into_inner()
    })
}

fn build_config(db_path: &str, config_toml: &str) -> Result<AppConfig, String> {
    let config = if config_toml.is_empty() {
        AppConfig::default()
    } else {
        AppConfig::from_toml_str(config_toml).map_err(|err| err.to_string())?
    };
    let mut config = config.with_env_overrides().map_err(|err| err.to_string())?;
    if !db_path.is_empty() {
        config.database.path = Some(PathBuf::from(db_path));
    } else if config.database.path.is_none() {
        config.database.path = Some(default_db_path());
    }
    Ok(config)
}

/// Env overrides are already applied by `build_config`.
fn default_db_path() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)
}

fn render(app: &App) -> UiSnapshot {
    let mut snapshot = UiSnapshot {
        route: app.route().name().to_string(),
        dialogs: app.dialogs().map(to_dialog_item).collect(),
        ..UiSnapshot::default()
    };
    if let Route::Home { owner_email, .. } = app.route() {
        snapshot.owner_email = Some(owner_email.clone());
    }
    match app.route() {
        Route::Login => snapshot.busy = app.login_screen().submitting,
        Route::Register => snapshot.busy = app.register_screen().submitting,
        Route::Home { .. } => {}
    }
    if let Some(screen) = app.notes_screen() {
        snapshot.notes = screen.notes.iter().map(to_note_item).collect();
        snapshot.notes_mode = match &screen.mode {
            NotesMode::Viewing => "viewing",
            NotesMode::Composing => "composing",
            NotesMode::Editing(_) => "editing",
        }
        .to_string();
        if let NotesMode::Editing(note) = &screen.mode {
            snapshot.editing_note_id = Some(note.id.to_string());
        }
        snapshot.form_title = screen.title.clone();
        snapshot.form_content = screen.content.clone();
        snapshot.search = screen.search.clone();
        snapshot.busy = screen.loading || screen.saving;
    }
    snapshot
}

fn to_note_item(note: &Note) -> NoteItem {
    NoteItem {
        id: note.id.to_string(),
        title: note.title.clone(),
        content: note.content.clone(),
        created_at_ms: note.created_at,
        updated_at_ms: note.updated_at,
    }
}

fn to_dialog_item(dialog: &Dialog) -> DialogItem {
    let (kind, confirm_label, cancel_label, destructive) = match &dialog.kind {
        DialogKind::Alert => ("alert", None, None, false),
        DialogKind::Confirm {
            confirm_label,
            cancel_label,
            destructive,
        } => (
            "confirm",
            Some(confirm_label.clone()),
            Some(cancel_label.clone()),
            *destructive,
        ),
    };
    DialogItem {
        title: dialog.title.clone(),
        message: dialog.message.clone(),
        kind: kind.to_string(),
        confirm_label,
        cancel_label,
        destructive,
    }
}
