//! Calendar timesheet CLI library.
//!
//! This crate provides the CLI interface for the timesheet builder.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, SheetsAction};
pub use config::Config;
