//! Storage layer for the timesheet builder.
//!
//! A `rusqlite`-backed tabular store: one sheet per client, each holding
//! numbered four-column rows. [`Database`] implements
//! [`ts_core::SheetStore`], so `ts_core::write_timesheet` can append to it
//! directly.
//!
//! # Thread Safety
//!
//! [`Database`] wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! Move it between threads freely, but do not share it without a `Mutex`.
//!
//! # Schema
//!
//! - `sheets`: one row per sheet; titles are unique ignoring ASCII case.
//! - `sheet_rows`: rows keyed by `(sheet, row_index)`, where `row_index` is
//!   1-based like a spreadsheet row number. Gaps are allowed and are what the
//!   blank separator rows between runs look like.
//!
//! Timestamps are stored as TEXT in RFC 3339 format.

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;
use ts_core::{OutputRow, SheetRange, SheetStore};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// The named sheet does not exist.
    #[error("unknown sheet: {0}")]
    UnknownSheet(String),
    /// A sheet with this title (in any casing) already exists.
    #[error("sheet already exists: {0}")]
    SheetExists(String),
    /// The range does not span exactly the rows supplied.
    #[error("range {range} spans {expected} rows but {actual} rows were supplied")]
    RangeMismatch {
        range: String,
        expected: usize,
        actual: usize,
    },
    /// A row index does not fit in SQLite's integer type.
    #[error("row index out of range: {0}")]
    RowOutOfRange(usize),
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Summary of one sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetInfo {
    pub title: String,
    /// 1-based index of the last populated row, 0 when empty.
    pub last_row: usize,
    pub row_count: usize,
}

/// A row as stored in a sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    pub row_index: usize,
    pub date_label: String,
    pub hours: f64,
    pub reserved: Option<String>,
    pub summary: String,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS sheets (
                title TEXT PRIMARY KEY COLLATE NOCASE,
                created_at TEXT NOT NULL
            );

            -- One timesheet row: columns A (date_label) to D (summary).
            CREATE TABLE IF NOT EXISTS sheet_rows (
                sheet TEXT NOT NULL COLLATE NOCASE,
                row_index INTEGER NOT NULL,
                date_label TEXT NOT NULL,
                hours REAL NOT NULL,
                reserved TEXT,
                summary TEXT NOT NULL,
                PRIMARY KEY (sheet, row_index),
                FOREIGN KEY (sheet) REFERENCES sheets(title) ON DELETE CASCADE
            );
            ",
        )?;
        Ok(())
    }

    /// Creates an empty sheet.
    pub fn create_sheet(&self, title: &str) -> Result<(), DbError> {
        if self.find_sheet(title)?.is_some() {
            return Err(DbError::SheetExists(title.to_string()));
        }
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        self.conn.execute(
            "INSERT INTO sheets (title, created_at) VALUES (?, ?)",
            params![title, created_at],
        )?;
        tracing::debug!(title, "created sheet");
        Ok(())
    }

    /// Lists sheets ordered by title, with their row statistics.
    pub fn list_sheets(&self) -> Result<Vec<SheetInfo>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT s.title, COALESCE(MAX(r.row_index), 0), COUNT(r.row_index)
            FROM sheets s
            LEFT JOIN sheet_rows r ON r.sheet = s.title
            GROUP BY s.title
            ORDER BY s.title ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;
        let mut sheets = Vec::new();
        for row in rows {
            let (title, last_row, row_count) = row?;
            sheets.push(SheetInfo {
                title,
                last_row: to_index(last_row),
                row_count: to_index(row_count),
            });
        }
        Ok(sheets)
    }

    /// Lists the rows of a sheet ordered by row index.
    pub fn list_rows(&self, sheet: &str) -> Result<Vec<StoredRow>, DbError> {
        let title = self.require_sheet(sheet)?;
        let mut stmt = self.conn.prepare(
            "
            SELECT row_index, date_label, hours, reserved, summary
            FROM sheet_rows
            WHERE sheet = ?
            ORDER BY row_index ASC
            ",
        )?;
        let rows = stmt.query_map([title], |row| {
            Ok(StoredRow {
                row_index: to_index(row.get(0)?),
                date_label: row.get(1)?,
                hours: row.get(2)?,
                reserved: row.get(3)?,
                summary: row.get(4)?,
            })
        })?;
        let mut stored = Vec::new();
        for row in rows {
            stored.push(row?);
        }
        Ok(stored)
    }

    /// Returns the canonical title of a sheet, matching case-insensitively.
    fn find_sheet(&self, title: &str) -> Result<Option<String>, DbError> {
        let found = self
            .conn
            .query_row("SELECT title FROM sheets WHERE title = ?", [title], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found)
    }

    fn require_sheet(&self, title: &str) -> Result<String, DbError> {
        self.find_sheet(title)?
            .ok_or_else(|| DbError::UnknownSheet(title.to_string()))
    }
}

impl SheetStore for Database {
    type Error = DbError;

    fn sheet_titles(&self) -> Result<Vec<String>, DbError> {
        Ok(self
            .list_sheets()?
            .into_iter()
            .map(|sheet| sheet.title)
            .collect())
    }

    fn last_row(&self, sheet: &str) -> Result<usize, DbError> {
        let title = self.require_sheet(sheet)?;
        let last: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(row_index), 0) FROM sheet_rows WHERE sheet = ?",
            [title],
            |row| row.get(0),
        )?;
        Ok(to_index(last))
    }

    /// Inserts the rows in one transaction; existing rows are never overwritten.
    fn append_rows(&mut self, range: &SheetRange, rows: &[OutputRow]) -> Result<usize, DbError> {
        if range.row_count != rows.len() {
            return Err(DbError::RangeMismatch {
                range: range.to_string(),
                expected: range.row_count,
                actual: rows.len(),
            });
        }
        let title = self.require_sheet(&range.sheet)?;

        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "
                INSERT INTO sheet_rows (sheet, row_index, date_label, hours, reserved, summary)
                VALUES (?, ?, ?, ?, ?, ?)
                ",
            )?;
            for (row_index, row) in range.rows().zip(rows) {
                let index = i64::try_from(row_index).map_err(|_| DbError::RowOutOfRange(row_index))?;
                inserted += stmt.execute(params![
                    title,
                    index,
                    row.date_label,
                    row.hours,
                    row.reserved,
                    row.summary,
                ])?;
            }
        }
        tx.commit()?;
        tracing::debug!(%range, inserted, "appended rows");
        Ok(inserted)
    }
}

/// Converts a non-negative SQLite integer to an index; negatives clamp to 0.
fn to_index(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}
