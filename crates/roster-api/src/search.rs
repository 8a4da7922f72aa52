//! Handler for `GET /search`.

use axum::{
  Extension, Json,
  extract::{Query, State},
};
use roster_core::{
  record::CitizenRecord,
  search::{recent, search},
  session::Session,
  store::RecordStore,
};
use serde::Deserialize;

use crate::{ApiState, error::ApiError, require_read};

/// Records returned for an empty query when no limit is given.
pub const DEFAULT_RECENT: usize = 100;

#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
  /// Case-insensitive substring matched against every field.
  #[serde(default)]
  pub q:     String,
  pub limit: Option<usize>,
}

/// `GET /search[?q=...][&limit=...]`
///
/// An empty query returns the latest `limit` records instead of the whole
/// table.
pub async fn handler<S>(
  State(state): State<ApiState<S>>,
  Extension(session): Extension<Session>,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<CitizenRecord>>, ApiError>
where
  S: RecordStore<Error = roster_core::Error>,
{
  require_read(&session)?;
  let records = state.store.read_all().await?;

  if params.q.trim().is_empty() {
    let n = params.limit.unwrap_or(DEFAULT_RECENT);
    return Ok(Json(recent(&records, n).to_vec()));
  }

  let mut hits: Vec<CitizenRecord> = search(&records, &params.q).into_iter().cloned().collect();
  if let Some(n) = params.limit {
    hits.truncate(n);
  }
  Ok(Json(hits))
}
