use axum::{
    Router,
    extract::FromRef,
    routing::{get, post},
};
use axum_extra::extract::cookie::Key;
use base64::Engine;

use crate::db::CustomerStore;
use crate::error::QualimedError;
use crate::handlers::auth::{admin_stats, login, logout, me, register};

#[derive(Clone)]
pub struct QualimedState {
    pub store: CustomerStore,
    key: Key,
}

impl QualimedState {
    pub fn new(store: CustomerStore, key: Key) -> Self {
        Self { store, key }
    }
}

impl FromRef<QualimedState> for Key {
    fn from_ref(state: &QualimedState) -> Self {
        state.key.clone()
    }
}

/// Decode the configured base64 cookie key, or generate a throwaway one.
/// Sessions do not survive a restart when the key is generated.
pub fn cookie_key(configured: Option<&str>) -> Result<Key, QualimedError> {
    let Some(encoded) = configured else {
        return Ok(Key::generate());
    };
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| QualimedError::CookieKey(e.to_string()))?;
    Key::try_from(bytes.as_slice()).map_err(|e| QualimedError::CookieKey(e.to_string()))
}

pub fn qualimed_router(state: QualimedState) -> Router {
    Router::new()
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/me", get(me))
        .route("/api/admin/stats", get(admin_stats))
        .with_state(state)
}
