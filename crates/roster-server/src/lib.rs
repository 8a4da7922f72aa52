//! HTTP server for the Roster registration campaign.
//!
//! Wraps [`roster_api`] with operator login, guest referral sessions and a
//! bearer-token middleware that attaches the caller's
//! [`roster_core::session::Session`] to every `/api` request.

pub mod auth;
pub mod error;
pub mod session;

pub use error::Error;

use std::{collections::HashMap, path::PathBuf, sync::Arc};

use axum::{
  Router, middleware,
  routing::{get, post},
};
use chrono::{Duration, FixedOffset};
use roster_api::Reporting;
use roster_core::{
  aggregate::SummarySettings,
  geo::{BoundaryIndex, DEFAULT_NAME_PROPERTY},
  place::PlaceNormalizer,
  sheet::DEFAULT_TABLE,
  store::RecordStore,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::{OperatorConfig, OperatorTable, SessionRegistry};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                   String,
  #[serde(default = "default_port")]
  pub port:                   u16,
  pub store_path:             PathBuf,
  #[serde(default = "default_table")]
  pub table_name:             String,
  #[serde(default)]
  pub operators:              Vec<OperatorConfig>,
  #[serde(default)]
  pub registration_goal:      usize,
  /// Campaign timezone as a whole-hour UTC offset.
  #[serde(default = "default_utc_offset")]
  pub utc_offset_hours:       i32,
  #[serde(default = "default_leaderboard")]
  pub leaderboard_size:       usize,
  #[serde(default = "default_session_hours")]
  pub session_hours:          i64,
  /// GeoJSON-shaped municipal boundaries for `/api/map`.
  pub boundary_path:          Option<PathBuf>,
  #[serde(default = "default_name_property")]
  pub boundary_name_property: String,
  /// Extra place-name variants, mapped to their canonical spelling.
  #[serde(default)]
  pub place_synonyms:         HashMap<String, String>,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8080 }
fn default_table() -> String { DEFAULT_TABLE.to_owned() }
fn default_utc_offset() -> i32 { -5 }
fn default_leaderboard() -> usize { 10 }
fn default_session_hours() -> i64 { 12 }
fn default_name_property() -> String { DEFAULT_NAME_PROPERTY.to_owned() }

const MAX_SESSION_HOURS: i64 = 24 * 366;

impl ServerConfig {
  pub fn utc_offset(&self) -> Result<FixedOffset, Error> {
    self
      .utc_offset_hours
      .checked_mul(3600)
      .and_then(FixedOffset::east_opt)
      .ok_or_else(|| Error::Config(format!("utc_offset_hours out of range: {}", self.utc_offset_hours)))
  }

  /// The place normalizer with configured synonyms layered over the
  /// built-in table.
  pub fn normalizer(&self) -> PlaceNormalizer {
    let mut normalizer = PlaceNormalizer::default();
    normalizer.extend(&self.place_synonyms);
    normalizer
  }

  /// Read-side settings for the API, with an already-loaded boundary index.
  pub fn reporting(&self, boundary: Option<BoundaryIndex>) -> Result<Reporting, Error> {
    Ok(Reporting {
      summary: SummarySettings {
        goal:             self.registration_goal,
        offset:           self.utc_offset()?,
        leaderboard_size: self.leaderboard_size,
        normalizer:       self.normalizer(),
      },
      boundary,
    })
  }

  /// Session lifetime; between one hour and a year.
  pub fn session_max_age(&self) -> Result<Duration, Error> {
    if !(1..=MAX_SESSION_HOURS).contains(&self.session_hours) {
      return Err(Error::Config(format!(
        "session_hours must be between 1 and {MAX_SESSION_HOURS}, got {}",
        self.session_hours
      )));
    }
    Ok(Duration::hours(self.session_hours))
  }

  pub fn auth_state(&self) -> Result<AuthState, Error> {
    Ok(AuthState {
      identities: Arc::new(OperatorTable::new(self.operators.iter().cloned())),
      sessions:   Arc::new(SessionRegistry::new(self.session_max_age()?)),
    })
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Credentials and live sessions, shared by the session handlers and the
/// auth middleware.
#[derive(Clone)]
pub struct AuthState {
  pub identities: Arc<OperatorTable>,
  pub sessions:   Arc<SessionRegistry>,
}

/// Everything the router needs.
pub struct AppState<S> {
  pub store:     Arc<S>,
  pub auth:      AuthState,
  pub reporting: Arc<Reporting>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: RecordStore<Error = roster_core::Error> + 'static,
{
  let api = roster_api::api_router(state.store, state.reporting).layer(
    middleware::from_fn_with_state(state.auth.sessions.clone(), auth::require_session),
  );

  Router::new()
    .route("/health", get(health))
    .route("/session", post(session::login).delete(session::logout))
    .route("/session/guest", post(session::guest))
    .with_state(state.auth)
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str { "ok" }

#[cfg(test)]
mod tests;
