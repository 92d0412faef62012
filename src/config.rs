//! Runtime configuration.
//!
//! Defaults are merged with `QUALIMED_`-prefixed environment variables, e.g.
//! `QUALIMED_DATABASE_URL=sqlite:/var/lib/qualimed/qualimed.db`.

use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};

use crate::error::QualimedError;
use crate::password::PasswordScheme;

pub const ENV_PREFIX: &str = "QUALIMED_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// SQLite connection string; the file is created when missing.
    pub database_url: String,
    pub listen_addr: String,
    pub loglevel: String,
    /// Scheme used for newly written password hashes.
    pub password_scheme: PasswordScheme,
    /// Base64 master key for the session cookie (at least 64 bytes decoded).
    /// A random key is generated per process when unset.
    pub cookie_key: Option<String>,
    pub max_connections: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:qualimed.db".to_string(),
            listen_addr: "0.0.0.0:8000".to_string(),
            loglevel: "info".to_string(),
            password_scheme: PasswordScheme::Argon2id,
            cookie_key: None,
            max_connections: 8,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, QualimedError> {
        Ok(Self::figment().extract()?)
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default())).merge(Env::prefixed(ENV_PREFIX))
    }
}
