//! Sheets command for listing and creating client sheets.

use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;
use ts_db::{Database, SheetInfo};

/// Sheet data for display.
#[derive(Debug, Clone, Serialize)]
pub struct SheetEntry {
    pub title: String,
    pub last_row: usize,
    pub row_count: usize,
}

impl From<SheetInfo> for SheetEntry {
    fn from(info: SheetInfo) -> Self {
        Self {
            title: info.title,
            last_row: info.last_row,
            row_count: info.row_count,
        }
    }
}

/// Format sheets for human-readable output.
pub fn write_sheets<W: Write>(writer: &mut W, entries: &[SheetEntry]) -> Result<()> {
    if entries.is_empty() {
        writeln!(writer, "No sheets yet.")?;
        writeln!(writer)?;
        writeln!(
            writer,
            "Hint: Run 'ts sheets create <client>' for each client you bill."
        )?;
        return Ok(());
    }

    writeln!(writer, "{:<24}  {:>8}  {:>5}", "Sheet", "Last row", "Rows")?;
    writeln!(writer, "────────────────────────  ────────  ─────")?;
    for entry in entries {
        writeln!(
            writer,
            "{:<24}  {:>8}  {:>5}",
            entry.title, entry.last_row, entry.row_count
        )?;
    }
    Ok(())
}

/// Runs `ts sheets list`.
pub fn list<W: Write>(writer: &mut W, db: &Database, json: bool) -> Result<()> {
    let entries: Vec<SheetEntry> = db
        .list_sheets()
        .context("failed to list sheets")?
        .into_iter()
        .map(SheetEntry::from)
        .collect();

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&entries)?)?;
    } else {
        write_sheets(writer, &entries)?;
    }
    Ok(())
}

/// Runs `ts sheets create`.
pub fn create<W: Write>(writer: &mut W, db: &Database, title: &str) -> Result<()> {
    db.create_sheet(title)
        .with_context(|| format!("failed to create sheet {title}"))?;
    writeln!(writer, "{title}")?;
    Ok(())
}
