use axum::extract::{FromRef, FromRequestParts};
use axum::http::{StatusCode, request::Parts};
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::cookie::Key;
use serde_json::json;

use crate::error::QualimedError;
use crate::session::{Identity, Session};

/// Ensure the session belongs to an administrator.
/// - no identity: 401 `UNAUTHENTICATED`
/// - identity without the admin flag: 403
pub fn ensure_admin(session: &Session) -> Result<&Identity, Response> {
    let Some(identity) = session.identity() else {
        return Err(QualimedError::Unauthenticated.into_response());
    };
    if !identity.is_admin {
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({"error": {"code": "FORBIDDEN", "message": "Administrator access required."}})),
        )
            .into_response());
    }
    Ok(identity)
}

#[derive(Debug, Clone)]
pub struct RequireAdmin(pub Identity);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = match Session::from_request_parts(parts, state).await {
            Ok(session) => session,
            Err(never) => match never {},
        };
        let identity = ensure_admin(&session)?.clone();
        Ok(Self(identity))
    }
}
