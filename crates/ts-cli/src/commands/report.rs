//! Report command: classify calendar events and append them to client sheets.
//!
//! This module implements `ts report`, which fetches the events in a date
//! range, prints a per-client summary and writes the timesheet rows into
//! the sheet store.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::Args;
use serde::Serialize;
use ts_core::{
    CalendarEvent, ClientFilter, ClientRegistry, ClientTotal, OutputRow, TimesheetConfig,
    TimesheetReport, WriteSummary, format_duration, write_timesheet,
};

use super::util::{open_database, resolve_range};
use crate::Config;

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Start of the range: YYYY-MM-DD, RFC 3339, or relative ("3 days ago").
    /// Defaults to the start of the current week (Sunday).
    #[arg(long)]
    pub start: Option<String>,

    /// End of the range; a calendar date includes the whole day. Defaults to now.
    #[arg(long)]
    pub end: Option<String>,

    /// Only report these clients (comma-separated).
    #[arg(long)]
    pub clients: Option<String>,

    /// Merge events on the same day into a single row.
    #[arg(long)]
    pub compress: bool,

    /// Print the summary without writing to the sheet store.
    #[arg(long)]
    pub no_sheet: bool,

    /// Read events from a Calendar API `events.list` JSON document instead of fetching.
    #[arg(long, value_name = "PATH")]
    pub events_file: Option<PathBuf>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Runs the report command.
pub fn run<W: Write>(writer: &mut W, args: &ReportArgs, config: &Config, verbose: bool) -> Result<()> {
    let timesheet = timesheet_config(args, config)?;
    let events = load_events(args, config)?;
    tracing::debug!(count = events.len(), "loaded events");

    let report = TimesheetReport::build(&events, &timesheet);

    if args.json {
        write_json(writer, &report)?;
    } else {
        write_summary(writer, &report, verbose)?;
    }

    if args.no_sheet {
        return Ok(());
    }

    let mut db = open_database(config)?;
    let summary = write_timesheet(&mut db, &report).context("failed to write timesheet")?;
    report_writes(&summary);
    Ok(())
}

fn timesheet_config(args: &ReportArgs, config: &Config) -> Result<TimesheetConfig> {
    if config.clients.is_empty() {
        bail!("no clients configured (set `clients` in config.toml or TS_CLIENTS)");
    }
    let registry =
        ClientRegistry::from_names(&config.clients).context("invalid client in configuration")?;
    let filter = args
        .clients
        .as_deref()
        .map(ClientFilter::parse_list)
        .transpose()
        .context("invalid --clients list")?;

    if config.self_email.trim().is_empty() {
        tracing::warn!("self_email is not configured; declined events will be reported");
    }

    Ok(TimesheetConfig {
        registry,
        filter,
        self_email: config.self_email.trim().to_string(),
        compress: args.compress,
    })
}

fn load_events(args: &ReportArgs, config: &Config) -> Result<Vec<CalendarEvent>> {
    if let Some(path) = &args.events_file {
        let body = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        return ts_gcal::parse_events_response(&body)
            .with_context(|| format!("invalid events file {}", path.display()));
    }

    let (start, end) = resolve_range(args.start.as_deref(), args.end.as_deref(), Utc::now())?;
    let token = config
        .access_token()
        .ok_or_else(|| anyhow::anyhow!("missing calendar access token (set TS_ACCESS_TOKEN or config.toml)"))?;

    tracing::debug!(%start, %end, calendar = %config.calendar_id, "fetching events");
    let client = ts_gcal::Client::new(token).context("failed to create calendar client")?;
    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
    runtime
        .block_on(client.list_events(&config.calendar_id, start, end))
        .context("failed to fetch calendar events")
}

// ========== Human-Readable Output ==========

/// Writes one line per classified event and a total for every client that
/// had events. Verbose output adds each event's raw calendar record.
pub fn write_summary<W: Write>(writer: &mut W, report: &TimesheetReport, verbose: bool) -> Result<()> {
    for (client, events) in report.events.non_empty() {
        for event in events {
            writeln!(writer, "Client: {client}, {event}")?;
            if verbose {
                writeln!(writer, "{}", serde_json::to_string_pretty(&event.original.raw)?)?;
            }
        }
        writeln!(
            writer,
            "Total: {}",
            format_duration(report.events.total_duration(client))
        )?;
        writeln!(writer)?;
    }
    Ok(())
}

fn report_writes(summary: &WriteSummary) {
    for write in &summary.written {
        eprintln!("Appended {} rows to {}", write.rows_written, write.range);
    }
    for client in &summary.missing_sheets {
        eprintln!("No sheet for client {client}; rows not written");
    }
}

// ========== JSON Output ==========

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    clients: Vec<JsonClient<'a>>,
    unattributable: Vec<String>,
    excluded: BTreeMap<&'static str, usize>,
}

#[derive(Debug, Serialize)]
struct JsonClient<'a> {
    #[serde(flatten)]
    total: ClientTotal,
    rows: &'a [OutputRow],
}

fn json_report(report: &TimesheetReport) -> JsonReport<'_> {
    let clients = report
        .totals()
        .into_iter()
        .map(|total| {
            let rows = report.rows_for(&total.client);
            JsonClient { total, rows }
        })
        .collect();

    JsonReport {
        clients,
        unattributable: report.unattributable.iter().map(ToString::to_string).collect(),
        excluded: report
            .excluded
            .iter()
            .map(|(reason, count)| (reason.as_str(), *count))
            .collect(),
    }
}

/// Writes the per-client totals and rows as JSON.
pub fn write_json<W: Write>(writer: &mut W, report: &TimesheetReport) -> Result<()> {
    writeln!(writer, "{}", serde_json::to_string_pretty(&json_report(report))?)?;
    Ok(())
}
