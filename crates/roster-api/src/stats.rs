//! Reporting handlers: grouped counts, daily series, dashboard summary, map.

use axum::{
  Extension, Json,
  extract::{Query, State},
};
use chrono::Utc;
use roster_core::{
  aggregate::{DailyCount, Summary, Tally, count_by_field, daily_counts, summarize, top_n},
  geo::{Choropleth, PlacePoint, choropleth, points},
  record::Field,
  session::Session,
  store::RecordStore,
};
use serde::Deserialize;

use crate::{ApiState, error::ApiError, require_read};

// ─── Counts ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CountParams {
  /// Column to group by, e.g. `city` or `registered_by`.
  pub field: Field,
  /// If set, only the `top` largest groups, descending.
  pub top:   Option<usize>,
}

/// `GET /counts?field=<field>[&top=n]`
///
/// Without `top`, groups come back in first-seen order.
pub async fn counts<S>(
  State(state): State<ApiState<S>>,
  Extension(session): Extension<Session>,
  Query(params): Query<CountParams>,
) -> Result<Json<Vec<Tally>>, ApiError>
where
  S: RecordStore<Error = roster_core::Error>,
{
  require_read(&session)?;
  let records = state.store.read_all().await?;
  let counts = count_by_field(&records, params.field);
  let tallies = match params.top {
    Some(0) => return Err(ApiError::BadRequest("top must be at least 1".to_owned())),
    Some(n) => top_n(&counts, n),
    None => counts.iter().cloned().collect(),
  };
  Ok(Json(tallies))
}

/// `GET /daily`: registrations per local calendar day.
pub async fn daily<S>(
  State(state): State<ApiState<S>>,
  Extension(session): Extension<Session>,
) -> Result<Json<Vec<DailyCount>>, ApiError>
where
  S: RecordStore<Error = roster_core::Error>,
{
  require_read(&session)?;
  let records = state.store.read_all().await?;
  Ok(Json(daily_counts(&records, state.reporting.summary.offset)))
}

// ─── Summary ──────────────────────────────────────────────────────────────────

/// `GET /stats`
pub async fn summary<S>(
  State(state): State<ApiState<S>>,
  Extension(session): Extension<Session>,
) -> Result<Json<Summary>, ApiError>
where
  S: RecordStore<Error = roster_core::Error>,
{
  require_read(&session)?;
  let records = state.store.read_all().await?;
  Ok(Json(summarize(&records, Utc::now(), &state.reporting.summary)))
}

// ─── Map ──────────────────────────────────────────────────────────────────────

/// `GET /map`: place counts joined against the configured boundaries.
pub async fn map<S>(
  State(state): State<ApiState<S>>,
  Extension(session): Extension<Session>,
) -> Result<Json<Choropleth>, ApiError>
where
  S: RecordStore<Error = roster_core::Error>,
{
  require_read(&session)?;
  let index = state
    .reporting
    .boundary
    .as_ref()
    .ok_or_else(|| ApiError::NotFound("no boundary document configured".to_owned()))?;
  let records = state.store.read_all().await?;
  Ok(Json(choropleth(&records, &state.reporting.summary.normalizer, index)))
}

/// `GET /points`: place counts as map markers; needs no boundary document.
pub async fn points_handler<S>(
  State(state): State<ApiState<S>>,
  Extension(session): Extension<Session>,
) -> Result<Json<Vec<PlacePoint>>, ApiError>
where
  S: RecordStore<Error = roster_core::Error>,
{
  require_read(&session)?;
  let records = state.store.read_all().await?;
  Ok(Json(points(&records, &state.reporting.summary.normalizer)))
}
