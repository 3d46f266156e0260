//! Appending timesheet rows to per-client sheets.
//!
//! Each client's rows go to the sheet titled after the client. New rows start
//! two rows below the last populated row, leaving one blank row as a visual
//! separator between runs.

use std::fmt;

use thiserror::Error;

use crate::compress::OutputRow;
use crate::report::TimesheetReport;
use crate::types::ClientId;

/// Rows left between existing data and the first appended row.
pub const ROW_GAP: usize = 2;

const FIRST_COLUMN: char = 'A';
const LAST_COLUMN: char = 'D';

/// A block of whole rows in one sheet, in A1 terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRange {
    pub sheet: String,
    /// 1-based index of the first row.
    pub first_row: usize,
    pub row_count: usize,
}

impl SheetRange {
    /// Range for `row_count` rows placed after a sheet whose last populated row is `last_row`.
    pub fn after_last_row(sheet: impl Into<String>, last_row: usize, row_count: usize) -> Self {
        Self {
            sheet: sheet.into(),
            first_row: last_row + ROW_GAP,
            row_count,
        }
    }

    /// 1-based index of the last row; equals `first_row - 1` for an empty range.
    pub const fn last_row(&self) -> usize {
        self.first_row + self.row_count - 1
    }

    /// Row indices covered by the range.
    pub const fn rows(&self) -> std::ops::Range<usize> {
        self.first_row..self.first_row + self.row_count
    }
}

impl fmt::Display for SheetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}!{FIRST_COLUMN}{}:{LAST_COLUMN}{}",
            self.sheet,
            self.first_row,
            self.last_row()
        )
    }
}

/// A tabular store holding one sheet per client.
pub trait SheetStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Titles of all sheets in the store.
    fn sheet_titles(&self) -> Result<Vec<String>, Self::Error>;

    /// 1-based index of the last populated row, or 0 for an empty sheet.
    fn last_row(&self, sheet: &str) -> Result<usize, Self::Error>;

    /// Writes `rows` into `range`. Returns the number of rows written.
    fn append_rows(&mut self, range: &SheetRange, rows: &[OutputRow]) -> Result<usize, Self::Error>;
}

/// Failure while writing a timesheet.
#[derive(Debug, Error)]
pub enum WriteError<E: std::error::Error + 'static> {
    /// The store could not list its sheets.
    #[error("failed to list sheets: {0}")]
    ListSheets(#[source] E),
    /// Reading or appending one client's sheet failed.
    #[error("failed to write timesheet for {client}: {source}")]
    Client {
        client: ClientId,
        #[source]
        source: E,
    },
}

/// Rows written for one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetWrite {
    pub client: ClientId,
    pub range: SheetRange,
    pub rows_written: usize,
}

/// Outcome of [`write_timesheet`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub written: Vec<SheetWrite>,
    /// Clients with rows but no sheet of their own.
    pub missing_sheets: Vec<ClientId>,
}

/// Appends every client's rows to the sheet named after the client.
///
/// Clients without rows are skipped, as are clients without a sheet (matched
/// case-insensitively). The first store failure aborts the write.
pub fn write_timesheet<S: SheetStore>(
    store: &mut S,
    report: &TimesheetReport,
) -> Result<WriteSummary, WriteError<S::Error>> {
    let mut summary = WriteSummary::default();
    let titles = store.sheet_titles().map_err(WriteError::ListSheets)?;

    for (client, rows) in &report.rows {
        if rows.is_empty() {
            continue;
        }

        let Some(title) = titles
            .iter()
            .find(|title| title.to_lowercase() == client.as_str())
        else {
            tracing::warn!(%client, "no sheet for client; skipping");
            summary.missing_sheets.push(client.clone());
            continue;
        };

        let wrap = |source| WriteError::Client {
            client: client.clone(),
            source,
        };
        let last_row = store.last_row(title).map_err(wrap)?;
        let range = SheetRange::after_last_row(title.as_str(), last_row, rows.len());
        let rows_written = store.append_rows(&range, rows).map_err(wrap)?;

        if rows_written == rows.len() {
            tracing::info!(%client, %range, rows_written, "appended timesheet rows");
        } else {
            tracing::warn!(
                %client,
                %range,
                expected = rows.len(),
                rows_written,
                "store wrote an unexpected number of rows"
            );
        }

        summary.written.push(SheetWrite {
            client: client.clone(),
            range,
            rows_written,
        });
    }

    Ok(summary)
}
