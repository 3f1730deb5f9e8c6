//! Identity collaborator.
//!
//! # Responsibility
//! - Register accounts and verify email/password logins.
//! - Track the signed-in user and notify observers when it changes.
//!
//! # Invariants
//! - Only PHC hash strings are persisted; raw passwords never leave the call.
//! - Email uniqueness is case-insensitive.
//! - Failed logins never change the current user.

pub mod hasher;
pub mod session;
pub mod sqlite_identity;

use crate::db::DbError;
use crate::model::user::{CredentialsError, UserHandle};
use std::error::Error;
use std::fmt::{Display, Formatter};
use tokio::sync::watch;

pub use hasher::{Argon2Hasher, CredentialHasher};
pub use session::Session;
pub use sqlite_identity::SqliteIdentity;

pub type AuthResult<T> = Result<T, AuthError>;

/// Identity failure.
#[derive(Debug)]
pub enum AuthError {
    Validation(CredentialsError),
    DuplicateAccount(String),
    InvalidCredentials,
    Hashing(String),
    Db(DbError),
    InvalidData(String),
}

impl AuthError {
    /// Returns whether the failure is an already-registered email.
    pub fn is_duplicate_account(&self) -> bool {
        matches!(self, Self::DuplicateAccount(_))
    }
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateAccount(email) => write!(f, "account already exists: {email}"),
            Self::InvalidCredentials => write!(f, "invalid email or password"),
            Self::Hashing(message) => write!(f, "password hashing failed: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted account data: {message}"),
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CredentialsError> for AuthError {
    fn from(value: CredentialsError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for AuthError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for AuthError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Email/password identity contract.
pub trait IdentityProvider {
    /// Creates an account. Does not sign the new user in.
    fn register(&self, email: &str, password: &str) -> AuthResult<UserHandle>;
    /// Verifies credentials and makes the user current.
    fn login(&self, email: &str, password: &str) -> AuthResult<UserHandle>;
    /// Clears the current user. Safe to call when nobody is signed in.
    fn logout(&self);
    fn current_user(&self) -> Option<UserHandle>;
    /// Observes current-user changes.
    fn watch_current_user(&self) -> watch::Receiver<Option<UserHandle>>;
}
