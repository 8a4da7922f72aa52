//! [`SqliteSheets`], the SQLite implementation of [`SheetBackend`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use roster_core::store::SheetBackend;

use crate::{
  Error, Result,
  encode::{decode_cells, encode_cells, encode_dt},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Named sheets of string rows kept in a single SQLite file.
///
/// Cloning shares the inner connection. All calls
/// run on one connection thread, so appends are totally ordered.
#[derive(Clone)]
pub struct SqliteSheets {
  conn: tokio_rusqlite::Connection,
}

/// An opened sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetHandle {
  name: String,
}

impl SheetHandle {
  pub fn name(&self) -> &str { &self.name }
}

impl SqliteSheets {
  /// Open (or create) a database at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory database, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Names of every sheet, oldest first.
  pub async fn sheet_names(&self) -> Result<Vec<String>> {
    let names = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT name FROM sheets ORDER BY created_at, name")?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(names)
  }
}

fn sheet_exists(conn: &rusqlite::Connection, name: &str) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM sheets WHERE name = ?1",
        rusqlite::params![name],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

// ─── SheetBackend impl ───────────────────────────────────────────────────────

impl SheetBackend for SqliteSheets {
  type Table = SheetHandle;
  type Error = Error;

  async fn open(&self, name: &str) -> Result<Option<SheetHandle>> {
    let name_str = name.to_owned();
    let exists = self
      .conn
      .call(move |conn| Ok(sheet_exists(conn, &name_str)?))
      .await?;
    Ok(exists.then(|| SheetHandle { name: name.to_owned() }))
  }

  async fn create(&self, name: &str) -> Result<SheetHandle> {
    let name_str = name.to_owned();
    let at_str   = encode_dt(Utc::now());

    let inserted = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "INSERT INTO sheets (name, created_at) VALUES (?1, ?2)
           ON CONFLICT (name) DO NOTHING",
          rusqlite::params![name_str, at_str],
        )?;
        Ok(changed == 1)
      })
      .await?;

    if !inserted {
      return Err(Error::SheetExists(name.to_owned()));
    }
    tracing::debug!(sheet = name, "created sheet");
    Ok(SheetHandle { name: name.to_owned() })
  }

  async fn append_row(&self, table: &SheetHandle, cells: Vec<String>) -> Result<()> {
    let sheet_str = table.name.clone();
    let cells_str = encode_cells(&cells)?;
    let at_str    = encode_dt(Utc::now());

    let appended = self
      .conn
      .call(move |conn| {
        if !sheet_exists(conn, &sheet_str)? {
          return Ok(false);
        }
        conn.execute(
          "INSERT INTO sheet_rows (sheet, row_index, cells_json, appended_at)
           SELECT ?1, COALESCE(MAX(row_index), 0) + 1, ?2, ?3
           FROM sheet_rows WHERE sheet = ?1",
          rusqlite::params![sheet_str, cells_str, at_str],
        )?;
        Ok(true)
      })
      .await?;

    if !appended {
      return Err(Error::SheetNotFound(table.name.clone()));
    }
    Ok(())
  }

  async fn rows(&self, table: &SheetHandle) -> Result<Vec<Vec<String>>> {
    let sheet_str = table.name.clone();

    let raws: Option<Vec<String>> = self
      .conn
      .call(move |conn| {
        if !sheet_exists(conn, &sheet_str)? {
          return Ok(None);
        }
        let mut stmt = conn.prepare(
          "SELECT cells_json FROM sheet_rows WHERE sheet = ?1 ORDER BY row_index",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![sheet_str], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(Some(rows))
      })
      .await?;

    raws
      .ok_or_else(|| Error::SheetNotFound(table.name.clone()))?
      .iter()
      .map(|s| decode_cells(s))
      .collect()
  }
}
