//! Password hashing.
//!
//! Two schemes can be stored side by side in `Customer.password_hash`:
//! - legacy: bare lowercase hex SHA-256 of the password (64 chars, unsalted)
//! - Argon2id: a PHC string (`$argon2id$v=19$...`) with a per-hash random salt
//!
//! The stored string itself is the version marker, so existing databases keep
//! working and legacy rows can be upgraded the next time their owner logs in.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::LazyLock;
use subtle::ConstantTimeEq;
use thiserror::Error;

const PHC_ARGON2_PREFIX: &str = "$argon2";
const DUMMY_PASSWORD: &str = "qualimed-no-such-customer";

// Stand-in for a stored hash when the email is unknown, so that lookup costs
// one real verify either way.
static DUMMY_ARGON2: LazyLock<Option<String>> =
    LazyLock::new(|| hash_for_storage(DUMMY_PASSWORD, PasswordScheme::Argon2id).ok());
static DUMMY_LEGACY: LazyLock<String> = LazyLock::new(|| hash(DUMMY_PASSWORD));

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(argon2::password_hash::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PasswordScheme {
    LegacySha256,
    Argon2id,
}

impl PasswordScheme {
    /// Identify the scheme a stored hash was written with.
    pub fn detect(stored: &str) -> Self {
        if stored.starts_with(PHC_ARGON2_PREFIX) {
            PasswordScheme::Argon2id
        } else {
            PasswordScheme::LegacySha256
        }
    }
}

/// Unsalted SHA-256 digest, hex encoded. Kept bit-exact with hashes already
/// stored by earlier deployments.
pub fn hash(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

pub fn hash_for_storage(password: &str, scheme: PasswordScheme) -> Result<String, PasswordError> {
    match scheme {
        PasswordScheme::LegacySha256 => Ok(hash(password)),
        PasswordScheme::Argon2id => {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map(|h| h.to_string())
                .map_err(PasswordError::Hash)
        }
    }
}

/// Check `password` against a stored hash of either scheme.
/// A malformed stored hash never verifies.
pub fn verify(password: &str, stored: &str) -> bool {
    match PasswordScheme::detect(stored) {
        PasswordScheme::LegacySha256 => hash(password).as_bytes().ct_eq(stored.as_bytes()).into(),
        PasswordScheme::Argon2id => {
            let Ok(parsed) = PasswordHash::new(stored) else {
                return false;
            };
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        }
    }
}

/// Hash of `scheme` that no customer owns.
pub fn dummy_hash(scheme: PasswordScheme) -> Option<&'static str> {
    match scheme {
        PasswordScheme::LegacySha256 => Some(DUMMY_LEGACY.as_str()),
        PasswordScheme::Argon2id => DUMMY_ARGON2.as_deref(),
    }
}

/// Spend the same work as [`verify`] against a `scheme` hash, for a login
/// whose email matched nothing. The outcome is discarded by callers.
pub fn verify_dummy(password: &str, scheme: PasswordScheme) -> bool {
    dummy_hash(scheme).is_some_and(|stored| verify(password, stored))
}

/// Whether a stored hash should be rewritten under `target`. Hashes are only
/// ever upgraded, never downgraded to the legacy scheme.
pub fn needs_rehash(stored: &str, target: PasswordScheme) -> bool {
    target == PasswordScheme::Argon2id
        && PasswordScheme::detect(stored) == PasswordScheme::LegacySha256
}
