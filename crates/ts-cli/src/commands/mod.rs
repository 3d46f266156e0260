//! CLI subcommand implementations.

pub mod report;
pub mod sheets;
pub mod util;
