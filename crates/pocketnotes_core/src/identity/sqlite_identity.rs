//! SQLite-backed identity collaborator over the `accounts` table.

use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension};
use std::time::Instant;
use tokio::sync::watch;
use uuid::Uuid;

use super::hasher::CredentialHasher;
use super::session::Session;
use super::{AuthError, AuthResult, IdentityProvider};
use crate::db::{now_epoch_ms, DbError};
use crate::model::user::{normalize_credentials, validate_email_shape, UserHandle};

pub struct SqliteIdentity<'a, H: CredentialHasher> {
    conn: &'a Connection,
    hasher: &'a H,
    session: Session,
}

impl<'a, H: CredentialHasher> SqliteIdentity<'a, H> {
    pub fn new(conn: &'a Connection, hasher: &'a H, session: Session) -> Self {
        Self {
            conn,
            hasher,
            session,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn email_taken(&self, email: &str) -> AuthResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE email = ?1);",
            [email],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn find_account(&self, email: &str) -> AuthResult<Option<(UserHandle, String)>> {
        let row = self
            .conn
            .query_row(
                "SELECT uid, email, password_hash FROM accounts WHERE email = ?1;",
                [email],
                |row| {
                    Ok((
                        row.get::<_, String>("uid")?,
                        row.get::<_, String>("email")?,
                        row.get::<_, String>("password_hash")?,
                    ))
                },
            )
            .optional()?;

        let Some((uid_text, stored_email, password_hash)) = row else {
            return Ok(None);
        };
        let uid = Uuid::parse_str(&uid_text).map_err(|_| {
            AuthError::InvalidData(format!("invalid uid value `{uid_text}` in accounts.uid"))
        })?;
        Ok(Some((
            UserHandle {
                uid,
                email: stored_email,
            },
            password_hash,
        )))
    }
}

impl<H: CredentialHasher> IdentityProvider for SqliteIdentity<'_, H> {
    fn register(&self, email: &str, password: &str) -> AuthResult<UserHandle> {
        let started_at = Instant::now();
        let (email, password) = normalize_credentials(email, password)?;
        validate_email_shape(email)?;

        if self.email_taken(email)? {
            info!(
                "event=auth_register module=identity status=error error_code=duplicate_account duration_ms={}",
                started_at.elapsed().as_millis()
            );
            return Err(AuthError::DuplicateAccount(email.to_string()));
        }

        let password_hash = self.hasher.hash_password(password)?;
        let user = UserHandle {
            uid: Uuid::new_v4(),
            email: email.to_string(),
        };
        if let Err(err) = self.conn.execute(
            "INSERT INTO accounts (uid, email, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                user.uid.to_string(),
                user.email.as_str(),
                password_hash,
                now_epoch_ms()
            ],
        ) {
            let err = DbError::from(err);
            return Err(if err.is_constraint_violation() {
                AuthError::DuplicateAccount(email.to_string())
            } else {
                err.into()
            });
        }

        info!(
            "event=auth_register module=identity status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok(user)
    }

    fn login(&self, email: &str, password: &str) -> AuthResult<UserHandle> {
        let started_at = Instant::now();
        let (email, password) = normalize_credentials(email, password)?;

        let verified = match self.find_account(email)? {
            Some((user, stored_hash)) if self.hasher.verify_password(&stored_hash, password) => {
                Some(user)
            }
            _ => None,
        };

        let Some(user) = verified else {
            warn!(
                "event=auth_login module=identity status=error error_code=invalid_credentials duration_ms={}",
                started_at.elapsed().as_millis()
            );
            return Err(AuthError::InvalidCredentials);
        };

        self.session.sign_in(user.clone());
        info!(
            "event=auth_login module=identity status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok(user)
    }

    fn logout(&self) {
        self.session.sign_out();
        info!("event=auth_logout module=identity status=ok");
    }

    fn current_user(&self) -> Option<UserHandle> {
        self.session.current()
    }

    fn watch_current_user(&self) -> watch::Receiver<Option<UserHandle>> {
        self.session.watch()
    }
}
