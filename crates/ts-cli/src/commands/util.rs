//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use regex::Regex;
use ts_db::Database;

use crate::Config;

/// Pre-compiled regex for relative time parsing.
static RELATIVE_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(minute|hour|day|week)s?\s+ago$").unwrap());

/// Conservative bounds for relative time parsing (~1000 years in minutes).
const MAX_RELATIVE_MINUTES: i64 = 1000 * 365 * 24 * 60;

/// A date argument: a whole local day or an exact instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateArg {
    Day(NaiveDate),
    Instant(DateTime<Utc>),
}

/// Parse a date argument relative to `now`.
///
/// Supports:
/// - Calendar date: "2025-03-04"
/// - RFC 3339: "2025-03-04T10:30:00Z"
/// - Relative: "2 hours ago", "3 days ago", "1 week ago"
pub fn parse_date(s: &str, now: DateTime<Utc>) -> Result<DateArg> {
    let s = s.trim();
    if let Ok(day) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(DateArg::Day(day));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(DateArg::Instant(dt.with_timezone(&Utc)));
    }

    let Some(caps) = RELATIVE_TIME_RE.captures(s) else {
        anyhow::bail!(
            "Invalid date: {s}. Use YYYY-MM-DD, RFC 3339 (e.g., 2025-03-04T10:30:00Z) or relative (e.g., '3 days ago')"
        );
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative time")?;

    let (max_for_unit, minutes_per_unit) = match &caps[2] {
        "minute" => (MAX_RELATIVE_MINUTES, 1),
        "hour" => (MAX_RELATIVE_MINUTES / 60, 60),
        "day" => (MAX_RELATIVE_MINUTES / (60 * 24), 60 * 24),
        "week" => (MAX_RELATIVE_MINUTES / (60 * 24 * 7), 60 * 24 * 7),
        unit => anyhow::bail!("Unknown time unit: {unit}"),
    };

    if n > max_for_unit {
        anyhow::bail!("Relative time value too large: {n} {}", &caps[2]);
    }

    Ok(DateArg::Instant(now - Duration::minutes(n * minutes_per_unit)))
}

/// Converts a local date at midnight to UTC.
/// Handles DST ambiguity by picking the earlier time, and a midnight
/// skipped by a DST jump by using 01:00.
fn local_midnight_to_utc(day: NaiveDate) -> Result<DateTime<Utc>> {
    let midnight = day.and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .or_else(|| {
            Local
                .from_local_datetime(&(midnight + Duration::hours(1)))
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("{day} has no local midnight"))
}

/// The Sunday starting the week that contains `today`.
pub fn week_start(today: NaiveDate) -> NaiveDate {
    today - Duration::days(i64::from(today.weekday().num_days_from_sunday()))
}

/// Resolves the `--start`/`--end` arguments into a half-open UTC range.
///
/// A missing start means the start of the current week; a missing end means
/// `now`. An end given as a calendar date includes that whole day.
pub fn resolve_range(
    start: Option<&str>,
    end: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = match start.map(|s| parse_date(s, now)).transpose()? {
        Some(DateArg::Day(day)) => local_midnight_to_utc(day)?,
        Some(DateArg::Instant(at)) => at,
        None => local_midnight_to_utc(week_start(now.with_timezone(&Local).date_naive()))?,
    };
    let end = match end.map(|s| parse_date(s, now)).transpose()? {
        Some(DateArg::Day(day)) => local_midnight_to_utc(day + Duration::days(1))?,
        Some(DateArg::Instant(at)) => at,
        None => now,
    };

    if start >= end {
        anyhow::bail!("start ({start}) must be before end ({end})");
    }
    Ok((start, end))
}

/// Opens the sheet store, creating its parent directory first.
pub fn open_database(config: &Config) -> Result<Database> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 6, 15, 0, 0).unwrap()
    }

    #[test]
    fn parses_calendar_date() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        assert_eq!(parse_date("2025-03-04", now()).unwrap(), DateArg::Day(day));
    }

    #[test]
    fn parses_rfc3339_as_instant() {
        let parsed = parse_date("2025-03-04T10:30:00-05:00", now()).unwrap();
        assert_eq!(
            parsed,
            DateArg::Instant(Utc.with_ymd_and_hms(2025, 3, 4, 15, 30, 0).unwrap())
        );
    }

    #[test]
    fn parses_relative_days() {
        let parsed = parse_date("3 days ago", now()).unwrap();
        assert_eq!(parsed, DateArg::Instant(now() - Duration::days(3)));
        let parsed = parse_date("1 week ago", now()).unwrap();
        assert_eq!(parsed, DateArg::Instant(now() - Duration::days(7)));
    }

    #[test]
    fn rejects_garbage() {
        let err = parse_date("last tuesday", now()).unwrap_err();
        assert!(err.to_string().contains("Invalid date"));
    }

    #[test]
    fn rejects_huge_relative_value() {
        assert!(parse_date("99999999 weeks ago", now()).is_err());
    }

    #[test]
    fn week_starts_on_sunday() {
        let thursday = NaiveDate::from_ymd_opt(2025, 3, 6).unwrap();
        let sunday = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();
        assert_eq!(week_start(thursday), sunday);
        assert_eq!(week_start(sunday), sunday);
    }

    #[test]
    fn end_date_is_inclusive() {
        let (start, end) = resolve_range(Some("2025-03-03"), Some("2025-03-04"), now()).unwrap();
        assert_eq!(end - start, Duration::days(2));
    }

    #[test]
    fn end_instant_is_exact() {
        let (_, end) = resolve_range(
            Some("2025-03-03T00:00:00Z"),
            Some("2025-03-04T12:00:00Z"),
            now(),
        )
        .unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 3, 4, 12, 0, 0).unwrap());
    }

    #[test]
    fn default_range_ends_now() {
        let (start, end) = resolve_range(None, None, now()).unwrap();
        assert_eq!(end, now());
        assert!(start < end);
        assert!(end - start <= Duration::days(8));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = resolve_range(Some("2025-03-05"), Some("2025-03-01"), now()).unwrap_err();
        assert!(err.to_string().contains("must be before"));
    }
}
