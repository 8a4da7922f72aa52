//! Operator credentials, session tokens, and the middleware that resolves
//! them.

use std::collections::HashMap;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::{Request, State},
  http::HeaderMap,
  middleware::Next,
  response::Response,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use chrono::{Duration, Utc};
use rand_core::{OsRng, RngCore as _};
use roster_core::session::{Identity, IdentityProvider, Session};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use crate::error::Error;

// ─── Operators ────────────────────────────────────────────────────────────────

/// One operator entry from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct OperatorConfig {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  #[serde(default)]
  pub admin:         bool,
}

/// The configured operators, keyed by lowercased username.
#[derive(Clone, Default)]
pub struct OperatorTable {
  operators: HashMap<String, OperatorConfig>,
}

fn username_key(username: &str) -> String { username.trim().to_lowercase() }

impl OperatorTable {
  pub fn new(operators: impl IntoIterator<Item = OperatorConfig>) -> Self {
    Self {
      operators: operators
        .into_iter()
        .map(|op| (username_key(&op.username), op))
        .collect(),
    }
  }

  fn identity(key: &str, op: &OperatorConfig) -> Identity {
    Identity { username: key.to_owned(), admin: op.admin }
  }
}

impl IdentityProvider for OperatorTable {
  fn verify(&self, username: &str, password: &str) -> Option<Identity> {
    let key = username_key(username);
    let op = self.operators.get(&key)?;
    let parsed_hash = PasswordHash::new(&op.password_hash).ok()?;
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed_hash)
      .ok()?;
    Some(Self::identity(&key, op))
  }

  fn lookup(&self, username: &str) -> Option<Identity> {
    let key = username_key(username);
    self.operators.get(&key).map(|op| Self::identity(&key, op))
  }
}

/// Extract `username:password` from an HTTP Basic `Authorization` header.
pub fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), Error> {
  headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|value| value.to_str().ok())
    .and_then(|value| value.strip_prefix("Basic "))
    .and_then(|encoded| B64.decode(encoded.trim()).ok())
    .and_then(|raw| String::from_utf8(raw).ok())
    .and_then(|pair| {
      pair
        .split_once(':')
        .map(|(user, password)| (user.to_owned(), password.to_owned()))
    })
    .ok_or(Error::BadCredentials)
}

/// Extract the token from an `Authorization: Bearer` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

// ─── Sessions ─────────────────────────────────────────────────────────────────

/// Live sessions keyed by the SHA-256 of their bearer token. Raw tokens are
/// handed to the client once and never stored.
pub struct SessionRegistry {
  sessions: RwLock<HashMap<String, Session>>,
  max_age:  Duration,
}

fn token_digest(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

impl SessionRegistry {
  pub fn new(max_age: Duration) -> Self {
    Self { sessions: RwLock::new(HashMap::new()), max_age }
  }

  fn expired(&self, session: &Session) -> bool { Utc::now() - session.started_at > self.max_age }

  /// Register `session` and return its bearer token. Expired sessions are
  /// swept out on the way.
  pub async fn issue(&self, session: Session) -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    let token = hex::encode(bytes);

    let mut sessions = self.sessions.write().await;
    let before = sessions.len();
    sessions.retain(|_, s| !self.expired(s));
    if sessions.len() < before {
      tracing::debug!(dropped = before - sessions.len(), "pruned expired sessions");
    }
    sessions.insert(token_digest(&token), session);
    token
  }

  /// The session behind `token`, unless unknown or expired. Expired sessions
  /// are dropped.
  pub async fn resolve(&self, token: &str) -> Option<Session> {
    let digest = token_digest(token);
    let session = self.sessions.read().await.get(&digest).cloned()?;
    if self.expired(&session) {
      self.sessions.write().await.remove(&digest);
      tracing::debug!(operator = session.operator.as_str(), "session expired");
      return None;
    }
    Some(session)
  }

  /// End a session. Returns whether one was found.
  pub async fn revoke(&self, token: &str) -> bool {
    self.sessions.write().await.remove(&token_digest(token)).is_some()
  }

  pub async fn len(&self) -> usize { self.sessions.read().await.len() }
}

/// Middleware: resolve the bearer token and attach its [`Session`] to the
/// request, or reject with 401.
pub async fn require_session(
  State(sessions): State<std::sync::Arc<SessionRegistry>>,
  mut req: Request,
  next: Next,
) -> Result<Response, Error> {
  let token = bearer_token(req.headers()).ok_or(Error::NoSession)?;
  let session = sessions.resolve(token).await.ok_or(Error::NoSession)?;
  req.extensions_mut().insert(session);
  Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
  use argon2::{PasswordHasher, password_hash::SaltString};
  use axum::http::{HeaderValue, header};

  use super::*;

  fn hash(password: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string()
  }

  fn table() -> OperatorTable {
    OperatorTable::new([
      OperatorConfig { username: "Fabian".into(), password_hash: hash("secret"), admin: true },
      OperatorConfig { username: "arturo".into(), password_hash: hash("clave"), admin: false },
    ])
  }

  fn headers(value: &str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    h
  }

  #[test]
  fn correct_credentials_verify() {
    let id = table().verify(" FABIAN ", "secret").unwrap();
    assert_eq!(id.username, "fabian");
    assert!(id.admin);
  }

  #[test]
  fn wrong_password_or_user_fails() {
    let t = table();
    assert!(t.verify("fabian", "wrong").is_none());
    assert!(t.verify("nobody", "secret").is_none());
  }

  #[test]
  fn lookup_needs_no_password() {
    assert!(!table().lookup("Arturo").unwrap().admin);
    assert!(table().lookup("ghost").is_none());
  }

  #[test]
  fn basic_header_parses() {
    let h = headers(&format!("Basic {}", B64.encode("fabian:se:cret")));
    assert_eq!(basic_credentials(&h).unwrap(), ("fabian".into(), "se:cret".into()));
  }

  #[test]
  fn malformed_basic_headers_are_rejected() {
    assert!(basic_credentials(&HeaderMap::new()).is_err());
    assert!(basic_credentials(&headers("Basic !!!not-base64!!!")).is_err());
    assert!(basic_credentials(&headers(&format!("Basic {}", B64.encode("nocolon")))).is_err());
    assert!(basic_credentials(&headers("Bearer abc")).is_err());
  }

  #[test]
  fn bearer_header_parses() {
    assert_eq!(bearer_token(&headers("Bearer abc123")), Some("abc123"));
    assert_eq!(bearer_token(&headers("Bearer ")), None);
    assert_eq!(bearer_token(&headers("Basic abc")), None);
  }

  #[tokio::test]
  async fn issued_tokens_resolve_until_revoked() {
    let registry = SessionRegistry::new(Duration::hours(12));
    let session = Session::login(&table().lookup("fabian").unwrap());
    let token = registry.issue(session.clone()).await;

    assert_eq!(token.len(), 64);
    assert_eq!(registry.resolve(&token).await, Some(session));
    assert!(registry.resolve("not-a-token").await.is_none());

    assert!(registry.revoke(&token).await);
    assert!(registry.resolve(&token).await.is_none());
    assert!(!registry.revoke(&token).await);
  }

  #[tokio::test]
  async fn issuing_sweeps_abandoned_sessions() {
    let registry = SessionRegistry::new(Duration::hours(1));
    let identity = table().lookup("arturo").unwrap();
    for _ in 0..100 {
      let mut stale = Session::login(&identity);
      stale.started_at = Utc::now() - Duration::hours(3);
      registry.sessions.write().await.insert(hex::encode(stale.session_id.as_bytes()), stale);
    }

    let token = registry.issue(Session::login(&identity)).await;
    assert_eq!(registry.len().await, 1);
    assert!(registry.resolve(&token).await.is_some());
  }

  #[tokio::test]
  async fn expired_sessions_are_dropped() {
    let registry = SessionRegistry::new(Duration::hours(1));
    let mut session = Session::login(&table().lookup("arturo").unwrap());
    session.started_at = Utc::now() - Duration::hours(2);
    let token = registry.issue(session).await;

    assert!(registry.resolve(&token).await.is_none());
    assert_eq!(registry.len().await, 0);
  }
}
