//! Error types and axum `IntoResponse` implementation.

use axum::{
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Login failed; the client should retry with Basic credentials.
  #[error("unauthorized")]
  BadCredentials,
  /// No valid session token on a request that needs one.
  #[error("unauthorized")]
  NoSession,
  #[error("not found: {0}")]
  NotFound(String),
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error("invalid configuration: {0}")]
  Config(String),
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::BadCredentials => {
        let mut res = (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"roster\""),
        );
        res
      }
      Error::NoSession => {
        let mut res = (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Bearer realm=\"roster\""),
        );
        res
      }
      Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
      Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
      Error::Config(msg) => {
        tracing::error!(msg = msg.as_str(), "configuration error");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
      }
    }
  }
}
