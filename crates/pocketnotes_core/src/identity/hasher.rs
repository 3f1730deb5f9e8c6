//! Password hashing.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use log::warn;

use super::{AuthError, AuthResult};

/// Turns passwords into storable hashes and checks them later.
pub trait CredentialHasher {
    /// Returns a PHC-formatted hash string with an embedded random salt.
    fn hash_password(&self, password: &str) -> AuthResult<String>;
    /// Returns whether `password` matches `stored_hash`.
    ///
    /// Malformed stored hashes verify as `false`.
    fn verify_password(&self, stored_hash: &str, password: &str) -> bool;
}

/// Argon2id v0x13 hasher.
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl Argon2Hasher {
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash_password(&self, password: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| AuthError::Hashing(err.to_string()))
    }

    fn verify_password(&self, stored_hash: &str, password: &str) -> bool {
        let parsed = match PasswordHash::new(stored_hash) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!("event=hash_verify module=identity status=error error_code=malformed_hash error={err}");
                return false;
            }
        };
        self.argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}
