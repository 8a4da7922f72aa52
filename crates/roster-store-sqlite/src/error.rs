//! Error type for `roster-store-sqlite`.

use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("sheet not found: {0}")]
  SheetNotFound(String),

  #[error("sheet already exists: {0}")]
  SheetExists(String),
}

impl Error {
  fn sqlite_code(&self) -> Option<ErrorCode> {
    match self {
      Error::Database(tokio_rusqlite::Error::Rusqlite(e)) => e.sqlite_error_code(),
      _ => None,
    }
  }
}

impl From<Error> for roster_core::Error {
  fn from(e: Error) -> Self {
    let message = e.to_string();
    match (&e, e.sqlite_code()) {
      (Error::SheetNotFound(_), _) => Self::NotFound(message),
      (
        _,
        Some(
          ErrorCode::PermissionDenied
          | ErrorCode::ReadOnly
          | ErrorCode::AuthorizationForStatementDenied,
        ),
      ) => Self::Auth(message),
      (_, Some(ErrorCode::CannotOpen)) => Self::NotFound(message),
      _ => Self::Transient(message),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
