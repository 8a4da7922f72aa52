//! Handlers for `/records`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/records` | Admin only; optional `?recent=n` |
//! | `POST` | `/records` | Body: [`NewRecord`]; returns 201 + stored record, 422 on invalid fields |

use axum::{
  Extension, Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use roster_core::{
  record::{CitizenRecord, NewRecord},
  search::recent,
  session::Session,
  store::RecordStore,
};
use serde::Deserialize;

use crate::{ApiState, error::ApiError, require_read};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// If set, only the last `recent` records.
  pub recent: Option<usize>,
}

/// `GET /records[?recent=n]`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Extension(session): Extension<Session>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<CitizenRecord>>, ApiError>
where
  S: RecordStore<Error = roster_core::Error>,
{
  require_read(&session)?;
  let mut records = state.store.read_all().await?;
  if let Some(n) = params.recent {
    records = recent(&records, n).to_vec();
  }
  Ok(Json(records))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /records`: returns 201 + the stored [`CitizenRecord`].
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  Extension(session): Extension<Session>,
  Json(body): Json<NewRecord>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore<Error = roster_core::Error>,
{
  if !session.can_register() {
    return Err(ApiError::Forbidden(format!("{} may not register", session.operator)));
  }
  let record = state.store.append(&session, body).await?;
  tracing::info!(
    submitter = record.registered_by.as_str(),
    guest = session.is_guest(),
    "registration saved"
  );
  Ok((StatusCode::CREATED, Json(record)))
}
