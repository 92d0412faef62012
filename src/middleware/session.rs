//! Per-request session backed by an encrypted private cookie.

use std::convert::Infallible;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};
use time::Duration;
use tracing::debug;

use crate::session::{Identity, Session};

pub const SESSION_COOKIE: &str = "qualimed_session";

const SESSION_TTL_HOURS: i64 = 12;

/// Rebuild the caller's session from the cookie jar. A missing, tampered or
/// unparseable cookie yields an unauthenticated session.
pub fn load_session(jar: &PrivateCookieJar) -> Session {
    let identity = jar.get(SESSION_COOKIE).and_then(|c| {
        serde_json::from_str::<Identity>(c.value())
            .inspect_err(|e| debug!(error = %e, "discarding unreadable session cookie"))
            .ok()
    });
    Session::new(identity)
}

/// Write `session` back: an identity is stored, an unauthenticated session
/// removes the cookie.
pub fn store_session(jar: PrivateCookieJar, session: &Session) -> PrivateCookieJar {
    let Some(identity) = session.identity() else {
        return jar.remove(clear_cookie());
    };
    match serde_json::to_string(identity) {
        Ok(value) => jar.add(build_cookie(value)),
        Err(e) => {
            debug!(error = %e, "failed to encode session; clearing cookie");
            jar.remove(clear_cookie())
        }
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = PrivateCookieJar::<Key>::from_request_parts(parts, state).await?;
        Ok(load_session(&jar))
    }
}

fn build_cookie(value: String) -> Cookie<'static> {
    Cookie::build(Cookie::new(SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::hours(SESSION_TTL_HOURS))
        .build()
}

fn clear_cookie() -> Cookie<'static> {
    Cookie::build(Cookie::new(SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}
