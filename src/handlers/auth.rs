use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::db::NewCustomer;
use crate::error::QualimedError;
use crate::middleware::auth::RequireAdmin;
use crate::middleware::session::{load_session, store_session};
use crate::router::QualimedState;
use crate::session::{Identity, Session};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub customer_id: i64,
}

/// POST /api/register
pub async fn register(
    State(state): State<QualimedState>,
    Json(new): Json<NewCustomer>,
) -> Result<impl IntoResponse, QualimedError> {
    validate_registration(&new)?;
    let customer_id = state.store.create_customer(&new).await?;
    Ok((StatusCode::CREATED, Json(RegisterResponse { customer_id })))
}

/// POST /api/login -> stores the identity in the session cookie.
///
/// A store failure answers 503 instead of 401 so clients can retry. The 503
/// depends only on the store being unreachable, never on the email, so it
/// tells nothing about which accounts exist.
pub async fn login(
    State(state): State<QualimedState>,
    jar: PrivateCookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, QualimedError> {
    let identity = match state.store.try_authenticate(&req.email, &req.password).await {
        Ok(Some(identity)) => identity,
        Ok(None) => return Err(QualimedError::InvalidCredentials),
        Err(e) => {
            error!(error = %e, "login failed against the store");
            return Err(e.into());
        }
    };

    let mut session = load_session(&jar);
    session.set_customer(Some(identity.clone()));
    info!(customer_id = identity.customer_id, "customer signed in");
    Ok((store_session(jar, &session), Json(identity)))
}

/// POST /api/logout
pub async fn logout(jar: PrivateCookieJar) -> impl IntoResponse {
    let mut session = load_session(&jar);
    if let Some(id) = session.customer_id() {
        info!(customer_id = id, "customer signed out");
    }
    session.clear();
    (store_session(jar, &session), StatusCode::NO_CONTENT)
}

/// GET /api/me
pub async fn me(session: Session) -> Result<Json<Identity>, QualimedError> {
    session
        .identity()
        .cloned()
        .map(Json)
        .ok_or(QualimedError::Unauthenticated)
}

fn validate_registration(new: &NewCustomer) -> Result<(), QualimedError> {
    if new.full_name.trim().is_empty() {
        return Err(QualimedError::Validation("full_name is required".to_string()));
    }
    if new.email.trim().is_empty() {
        return Err(QualimedError::Validation("email is required".to_string()));
    }
    if new.password.is_empty() {
        return Err(QualimedError::Validation("password is required".to_string()));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StoreStats {
    pub customers: i64,
}

/// GET /api/admin/stats
pub async fn admin_stats(
    State(state): State<QualimedState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<StoreStats>, QualimedError> {
    let customers = state.store.count_customers().await?;
    info!(customer_id = admin.customer_id, "admin requested store stats");
    Ok(Json(StoreStats { customers }))
}
