//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::report::ReportArgs;

/// Calendar-to-timesheet builder.
///
/// Reads calendar events, attributes each one to a billing client and
/// appends per-client timesheet rows to the sheet store.
#[derive(Debug, Parser)]
#[command(name = "ts", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build the timesheet for a date range and write it to client sheets.
    Report(ReportArgs),

    /// Manage client sheets in the store.
    #[command(subcommand)]
    Sheets(SheetsAction),
}

/// Actions for the sheets subcommand.
#[derive(Debug, Subcommand)]
pub enum SheetsAction {
    /// List sheets with their last populated row.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Create a sheet for a client.
    Create {
        /// Sheet title; must match the client name (case-insensitive).
        title: String,
    },
}
