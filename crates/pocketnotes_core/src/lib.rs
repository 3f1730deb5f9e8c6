//! Application core for PocketNotes.
//! Screens, collaborators and the navigation shell live here; the mobile UI
//! only renders state and forwards user intents.

pub mod app;
pub mod config;
pub mod db;
pub mod identity;
pub mod logging;
pub mod model;
pub mod repo;
pub mod screens;
pub mod store;

pub use app::{App, AppError, AppResult, UiEvent};
pub use config::{AppConfig, ConfigError};
pub use identity::{
    Argon2Hasher, AuthError, AuthResult, CredentialHasher, IdentityProvider, Session,
    SqliteIdentity,
};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::note::{Note, NoteDraft, NoteId, NoteValidationError, OwnerId};
pub use model::user::{CredentialsError, UserHandle, UserId};
pub use repo::note_repo::{
    DocumentNoteRepository, NoteRepository, NotesSubscription, RepoError, RepoResult,
};
pub use screens::auth::{AuthFailure, LoginMsg, LoginScreen, RegisterMsg, RegisterScreen};
pub use screens::navigation::{Navigator, Route};
pub use screens::notes::{NotesMode, NotesMsg, NotesScreen};
pub use screens::{Dialog, DialogKind, Effect, NavAction};
pub use store::{ChangeFeed, DocumentStore, SqliteDocumentStore, StoreError, StoreResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
