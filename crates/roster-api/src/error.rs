//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Store(#[from] roster_core::Error),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    use roster_core::Error as E;

    let (status, body) = match &self {
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, json!({ "error": m })),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "error": m })),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, json!({ "error": m })),
      ApiError::Store(E::Validation(fields)) => (
        StatusCode::UNPROCESSABLE_ENTITY,
        json!({ "error": "invalid registration", "fields": fields }),
      ),
      ApiError::Store(e) => {
        let status = match e {
          E::NotFound(_) => StatusCode::NOT_FOUND,
          E::Auth(_) => StatusCode::BAD_GATEWAY,
          E::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
          _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::warn!(error = %e, %status, "store error");
        (status, json!({ "error": e.to_string() }))
      }
    };
    (status, Json(body)).into_response()
  }
}
