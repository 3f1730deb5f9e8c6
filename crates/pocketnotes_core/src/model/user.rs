//! Identity records and credential checks.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Opaque identifier issued by the identity collaborator.
pub type UserId = Uuid;

/// Authenticated user handle. Carries no secret material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserHandle {
    pub uid: UserId,
    pub email: String,
}

/// Credential shape failure, raised before any remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsError {
    EmptyEmail,
    EmptyPassword,
    MalformedEmail(String),
}

impl Display for CredentialsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::MalformedEmail(value) => write!(f, "malformed email address: `{value}`"),
        }
    }
}

impl Error for CredentialsError {}

/// Trims the email and checks both fields are present.
///
/// The password is returned untouched; only its blankness is checked.
pub fn normalize_credentials<'a>(
    email: &'a str,
    password: &'a str,
) -> Result<(&'a str, &'a str), CredentialsError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(CredentialsError::EmptyEmail);
    }
    if password.trim().is_empty() {
        return Err(CredentialsError::EmptyPassword);
    }
    Ok((email, password))
}

/// Checks the email has a `local@domain.tld` shape.
pub fn validate_email_shape(email: &str) -> Result<(), CredentialsError> {
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(CredentialsError::MalformedEmail(email.to_string()))
    }
}
