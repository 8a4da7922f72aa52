//! The `RecordStore` trait and the spreadsheet backend contract beneath it.
//!
//! Higher layers (`roster-api`, `roster-server`) depend on [`RecordStore`].
//! [`crate::sheet::SheetStore`] implements it over any [`SheetBackend`], which
//! is the narrow interface a tabular service has to offer.

use std::future::Future;

use crate::{
  record::{CitizenRecord, NewRecord},
  session::Session,
};

// ─── RecordStore ─────────────────────────────────────────────────────────────

/// Append-only storage of citizen registrations.
///
/// There is no update or delete. Concurrent appends are ordered only by
/// whatever the backend guarantees.
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Validate `input`, stamp it with the current time and the session's
  /// submitter, and append it as one row. Creates the table (with its header
  /// row) on first use.
  fn append<'a>(
    &'a self,
    session: &'a Session,
    input: NewRecord,
  ) -> impl Future<Output = Result<CitizenRecord, Self::Error>> + Send + 'a;

  /// Every stored record in append order. An empty or not-yet-created table
  /// is `Ok(vec![])`, never an error.
  fn read_all(
    &self,
  ) -> impl Future<Output = Result<Vec<CitizenRecord>, Self::Error>> + Send + '_;
}

// ─── SheetBackend ────────────────────────────────────────────────────────────

/// A named-table service that stores rows of string cells.
///
/// Errors must convert into [`crate::Error`] so the store can report the
/// auth / not-found / transient distinction.
pub trait SheetBackend: Send + Sync {
  /// An opened table. Cheap to clone.
  type Table: Clone + Send + Sync + 'static;
  type Error: std::error::Error + Send + Sync + 'static;

  /// Open an existing table; `None` if no table has that name.
  fn open<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Self::Table>, Self::Error>> + Send + 'a;

  /// Create an empty table.
  fn create<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Self::Table, Self::Error>> + Send + 'a;

  /// Append one row after the last existing row.
  fn append_row<'a>(
    &'a self,
    table: &'a Self::Table,
    cells: Vec<String>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Every row in order, header included.
  fn rows<'a>(
    &'a self,
    table: &'a Self::Table,
  ) -> impl Future<Output = Result<Vec<Vec<String>>, Self::Error>> + Send + 'a;
}
