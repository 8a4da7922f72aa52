//! Error types for `roster-core`.
//!
//! [`Error`] is the taxonomy every layer above the store speaks. Backend
//! crates convert their own errors into it with `From`.

use serde::Serialize;
use thiserror::Error;

use crate::record::Field;

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
  pub field:   Field,
  pub message: String,
}

/// Every field that failed validation for one submission.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
  pub fn push(&mut self, field: Field, message: impl Into<String>) {
    self.0.push(FieldError { field, message: message.into() });
  }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
    self.0.iter().map(|e| e.field)
  }
}

impl std::fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let parts: Vec<String> = self
      .0
      .iter()
      .map(|e| format!("{}: {}", e.field.header(), e.message))
      .collect();
    f.write_str(&parts.join("; "))
  }
}

#[derive(Debug, Error)]
pub enum Error {
  /// The backing store refused our credentials or permissions.
  #[error("backing store rejected credentials: {0}")]
  Auth(String),

  /// The table (or worksheet) is absent and could not be created.
  #[error("table not found: {0}")]
  NotFound(String),

  /// Any other failure talking to the backing store.
  #[error("backing store unavailable: {0}")]
  Transient(String),

  #[error("invalid registration: {0}")]
  Validation(ValidationErrors),

  /// A stored row could not be decoded into a record.
  #[error("malformed row {row}: {reason}")]
  MalformedRow { row: usize, reason: String },

  #[error("invalid boundary document: {0}")]
  Boundary(String),
}

impl From<ValidationErrors> for Error {
  fn from(errors: ValidationErrors) -> Self { Self::Validation(errors) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
