//! [`SheetStore`], a [`RecordStore`] over any [`SheetBackend`].

use chrono::{SubsecRound as _, Utc};
use tokio::sync::OnceCell;

use crate::{
  Error, Result,
  record::{CitizenRecord, Field, NewRecord},
  session::Session,
  store::{RecordStore, SheetBackend},
};

/// Default table name used by the campaign.
pub const DEFAULT_TABLE: &str = "Base_Datos_Ciudadanos";

/// Stores citizen records as rows of a named backend table.
///
/// The table handle is resolved on first use and cached for the life of the
/// store. Resolution for writes is serialized, so two first appends racing
/// each other create the table and its header exactly once.
pub struct SheetStore<B: SheetBackend> {
  backend:    B,
  table_name: String,
  table:      OnceCell<B::Table>,
}

impl<B> SheetStore<B>
where
  B: SheetBackend,
  Error: From<B::Error>,
{
  pub fn new(backend: B, table_name: impl Into<String>) -> Self {
    Self { backend, table_name: table_name.into(), table: OnceCell::new() }
  }

  pub fn backend(&self) -> &B { &self.backend }

  /// Resolve the table for writing, creating it with a header if needed.
  async fn writable_table(&self) -> Result<&B::Table> {
    self
      .table
      .get_or_try_init(|| async {
        let name = self.table_name.as_str();
        let table = match self.backend.open(name).await? {
          Some(table) => table,
          None => {
            tracing::info!(table = name, "creating registration table");
            match self.backend.create(name).await {
              Ok(table) => table,
              // Another writer may have created it first.
              Err(e) => match self.backend.open(name).await? {
                Some(table) => table,
                None => {
                  return Err(match Error::from(e) {
                    e @ Error::Auth(_) => e,
                    other => Error::NotFound(format!("could not create {name}: {other}")),
                  });
                }
              },
            }
          }
        };
        if self.backend.rows(&table).await?.is_empty() {
          self.backend.append_row(&table, Field::header_row()).await?;
        }
        Ok::<_, Error>(table)
      })
      .await
  }

  /// Map raw rows (header first) to records. Rows that do not decode are
  /// logged and left out.
  fn decode(rows: Vec<Vec<String>>) -> Vec<CitizenRecord> {
    let mut rows = rows.into_iter();
    let Some(header) = rows.next() else {
      return Vec::new();
    };

    let columns: Vec<Option<Field>> = header
      .iter()
      .map(|cell| {
        let field = Field::from_header(cell);
        if field.is_none() && !cell.trim().is_empty() {
          tracing::debug!(header = cell.trim(), "ignoring unknown column");
        }
        field
      })
      .collect();

    rows
      .enumerate()
      .filter(|(_, cells)| cells.iter().any(|c| !c.trim().is_empty()))
      .filter_map(|(i, cells)| match CitizenRecord::from_row(&columns, &cells, i + 2) {
        Ok(record) => Some(record),
        Err(e) => {
          tracing::warn!(error = %e, "skipping unreadable row");
          None
        }
      })
      .collect()
  }
}

impl<B> RecordStore for SheetStore<B>
where
  B: SheetBackend,
  Error: From<B::Error>,
{
  type Error = Error;

  async fn append(&self, session: &Session, input: NewRecord) -> Result<CitizenRecord> {
    let input = input.prepare()?;
    // Cells hold whole seconds; stamp at that precision so the returned
    // record equals what a later read produces.
    let record = input.into_record(Utc::now().trunc_subsecs(0), session.submitter().to_owned());

    let table = self.writable_table().await?;
    self.backend.append_row(table, record.to_row()).await?;

    tracing::debug!(
      table = self.table_name.as_str(),
      submitter = record.registered_by.as_str(),
      "appended registration"
    );
    Ok(record)
  }

  async fn read_all(&self) -> Result<Vec<CitizenRecord>> {
    let table = match self.table.get() {
      Some(table) => table.clone(),
      None => match self.backend.open(&self.table_name).await? {
        Some(table) => table,
        None => {
          tracing::debug!(table = self.table_name.as_str(), "table does not exist yet");
          return Ok(Vec::new());
        }
      },
    };

    let rows = self.backend.rows(&table).await?;
    // Only cache tables that already carry a header; the write path adds
    // one to headerless tables before caching them.
    if !rows.is_empty() {
      let _ = self.table.set(table);
    }
    Ok(Self::decode(rows))
  }
}
