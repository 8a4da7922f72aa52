//! JSON REST API for Roster.
//!
//! Exposes an axum [`Router`] backed by any [`RecordStore`]. Authentication is
//! the caller's responsibility: every request must carry a
//! [`roster_core::session::Session`] extension, inserted by whatever layer
//! resolved the caller's credentials.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", roster_api::api_router(store.clone(), reporting))
//! ```

pub mod error;
pub mod records;
pub mod search;
pub mod stats;

use std::sync::Arc;

use axum::{Router, routing::get};
use roster_core::{
  aggregate::SummarySettings, geo::BoundaryIndex, session::Session, store::RecordStore,
};

pub use error::ApiError;

/// Read-side configuration shared by the reporting handlers.
#[derive(Debug, Clone)]
pub struct Reporting {
  pub summary:  SummarySettings,
  /// Municipal boundaries for the map view; `None` disables `/map`.
  pub boundary: Option<BoundaryIndex>,
}

/// State threaded through every API handler.
pub struct ApiState<S> {
  pub store:     Arc<S>,
  pub reporting: Arc<Reporting>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), reporting: self.reporting.clone() }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, reporting: Arc<Reporting>) -> Router<()>
where
  S: RecordStore<Error = roster_core::Error> + 'static,
{
  Router::new()
    // Records
    .route("/records", get(records::list::<S>).post(records::create::<S>))
    // Search
    .route("/search", get(search::handler::<S>))
    // Reporting
    .route("/counts", get(stats::counts::<S>))
    .route("/daily", get(stats::daily::<S>))
    .route("/stats", get(stats::summary::<S>))
    .route("/map", get(stats::map::<S>))
    .route("/points", get(stats::points_handler::<S>))
    .with_state(ApiState { store, reporting })
}

/// Reject sessions that may not read the registry.
pub(crate) fn require_read(session: &Session) -> Result<(), ApiError> {
  if session.can_read() {
    Ok(())
  } else {
    Err(ApiError::Forbidden(format!(
      "{} may register but not read records",
      session.operator
    )))
  }
}
