//! Login, guest referral, and logout handlers.

use axum::{
  Json,
  extract::State,
  http::{HeaderMap, StatusCode},
};
use roster_core::session::{IdentityProvider as _, Role, Session};
use serde::{Deserialize, Serialize};

use crate::{
  AuthState,
  auth::{basic_credentials, bearer_token},
  error::Error,
};

/// Returned to the client on login. `token` goes into
/// `Authorization: Bearer` on every `/api` request.
#[derive(Debug, Serialize)]
pub struct Issued {
  pub token:    String,
  pub operator: String,
  pub role:     Role,
}

#[derive(Debug, Deserialize)]
pub struct GuestRequest {
  pub referrer: String,
}

async fn issue(auth: &AuthState, session: Session) -> Issued {
  let operator = session.operator.clone();
  let role = session.role.clone();
  let token = auth.sessions.issue(session).await;
  Issued { token, operator, role }
}

/// `POST /session` with HTTP Basic credentials.
pub async fn login(
  State(auth): State<AuthState>,
  headers: HeaderMap,
) -> Result<Json<Issued>, Error> {
  let (username, password) = basic_credentials(&headers)?;
  let Some(identity) = auth.identities.verify(&username, &password) else {
    tracing::info!(username = username.as_str(), "login rejected");
    return Err(Error::BadCredentials);
  };
  tracing::info!(operator = identity.username.as_str(), admin = identity.admin, "login");
  Ok(Json(issue(&auth, Session::login(&identity)).await))
}

/// `POST /session/guest`: open a registration-only session credited to a
/// known operator.
pub async fn guest(
  State(auth): State<AuthState>,
  Json(req): Json<GuestRequest>,
) -> Result<Json<Issued>, Error> {
  let referrer = req.referrer.trim();
  if referrer.is_empty() {
    return Err(Error::BadRequest("referrer is required".to_owned()));
  }
  let identity = auth
    .identities
    .lookup(referrer)
    .ok_or_else(|| Error::NotFound(format!("unknown referrer: {referrer}")))?;
  tracing::info!(referrer = identity.username.as_str(), "guest session");
  Ok(Json(issue(&auth, Session::guest(&identity)).await))
}

/// `DELETE /session`
pub async fn logout(
  State(auth): State<AuthState>,
  headers: HeaderMap,
) -> Result<StatusCode, Error> {
  let token = bearer_token(&headers).ok_or(Error::NoSession)?;
  if auth.sessions.revoke(token).await {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(Error::NoSession)
  }
}
