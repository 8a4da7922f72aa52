//! SQL schema for the Roster SQLite sheet backend.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS sheets (
    name        TEXT PRIMARY KEY,
    created_at  TEXT NOT NULL
);

-- Rows are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS sheet_rows (
    sheet        TEXT    NOT NULL REFERENCES sheets(name),
    row_index    INTEGER NOT NULL,   -- 1-based; row 1 is the header
    cells_json   TEXT    NOT NULL,   -- JSON array of strings
    appended_at  TEXT    NOT NULL,   -- ISO 8601 UTC
    PRIMARY KEY (sheet, row_index)
);

PRAGMA user_version = 1;
";
