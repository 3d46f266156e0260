//! Conversion of a client's classified events into timesheet rows.
//!
//! Without compression every event becomes one row. With compression an event
//! is folded into the row appended just before it when both fall on the same
//! month and day. Only that immediately preceding row is considered: two
//! same-day runs separated by another day stay separate rows.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::event::ClassifiedEvent;

/// One timesheet row: four columns, `A` to `D`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRow {
    /// `month/day`, day zero-padded (`3/04`).
    pub date_label: String,
    /// Decimal hours.
    pub hours: f64,
    /// Unused third column, always empty.
    pub reserved: Option<String>,
    pub summary: String,
}

impl OutputRow {
    pub fn from_event(event: &ClassifiedEvent) -> Self {
        Self {
            date_label: date_label(event.date),
            hours: event.hours(),
            reserved: None,
            summary: event.summary.clone(),
        }
    }

    fn absorb(&mut self, event: &ClassifiedEvent) {
        self.hours += event.hours();
        self.summary.push_str(", ");
        self.summary.push_str(&event.summary);
    }
}

/// Formats a date as `month/day` with a two-digit day.
pub fn date_label(date: NaiveDate) -> String {
    format!("{}/{:02}", date.month(), date.day())
}

/// Builds output rows from one client's ordered events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCompressor {
    compress: bool,
}

/// Fold state: the date of the last event processed and the rows so far.
#[derive(Debug, Default)]
struct Cursor {
    last_date: Option<NaiveDate>,
    rows: Vec<OutputRow>,
}

impl RowCompressor {
    pub const fn new(compress: bool) -> Self {
        Self { compress }
    }

    pub fn rows(self, events: &[ClassifiedEvent]) -> Vec<OutputRow> {
        events
            .iter()
            .fold(Cursor::default(), |cursor, event| self.step(cursor, event))
            .rows
    }

    fn step(self, mut cursor: Cursor, event: &ClassifiedEvent) -> Cursor {
        let same_day = cursor
            .last_date
            .is_some_and(|last| last.month() == event.date.month() && last.day() == event.date.day());

        match cursor.rows.last_mut() {
            Some(row) if self.compress && same_day => row.absorb(event),
            _ => cursor.rows.push(OutputRow::from_event(event)),
        }

        cursor.last_date = Some(event.date);
        cursor
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::event::CalendarEvent;
    use crate::types::{ClientId, EventId};

    fn event(year: i32, month: u32, day: u32, minutes: i64, summary: &str) -> ClassifiedEvent {
        ClassifiedEvent {
            date: NaiveDate::from_ymd_opt(year, month, day).unwrap(),
            duration: Duration::minutes(minutes),
            summary: summary.to_string(),
            client: ClientId::new("clienta").unwrap(),
            original: CalendarEvent {
                id: EventId::new("evt").unwrap(),
                start: None,
                end: None,
                summary: summary.to_string(),
                organizer: None,
                attendees: Vec::new(),
                raw: serde_json::Value::Null,
            },
        }
    }

    fn total_hours(rows: &[OutputRow]) -> f64 {
        rows.iter().map(|row| row.hours).sum()
    }

    #[test]
    fn date_label_pads_day_only() {
        assert_eq!(date_label(NaiveDate::from_ymd_opt(2025, 3, 4).unwrap()), "3/04");
        assert_eq!(date_label(NaiveDate::from_ymd_opt(2025, 11, 21).unwrap()), "11/21");
    }

    #[test]
    fn uncompressed_emits_one_row_per_event() {
        let events = vec![
            event(2025, 3, 4, 30, "clienta standup"),
            event(2025, 3, 4, 60, "clienta review"),
        ];
        let rows = RowCompressor::new(false).rows(&events);
        assert_eq!(
            rows,
            vec![
                OutputRow {
                    date_label: "3/04".to_string(),
                    hours: 0.5,
                    reserved: None,
                    summary: "clienta standup".to_string(),
                },
                OutputRow {
                    date_label: "3/04".to_string(),
                    hours: 1.0,
                    reserved: None,
                    summary: "clienta review".to_string(),
                },
            ]
        );
    }

    #[test]
    fn compressed_merges_same_day_events() {
        let events = vec![
            event(2025, 3, 4, 30, "clienta standup"),
            event(2025, 3, 4, 60, "clienta review"),
        ];
        let rows = RowCompressor::new(true).rows(&events);
        assert_eq!(rows.len(), 1);
        assert!((rows[0].hours - 1.5).abs() < f64::EPSILON);
        assert_eq!(rows[0].summary, "clienta standup, clienta review");
        assert_eq!(rows[0].date_label, "3/04");
    }

    #[test]
    fn compression_only_looks_at_previous_row() {
        let events = vec![
            event(2025, 3, 4, 30, "a"),
            event(2025, 3, 5, 30, "b"),
            event(2025, 3, 4, 30, "c"),
            event(2025, 3, 4, 45, "d"),
        ];
        let rows = RowCompressor::new(true).rows(&events);
        let summaries: Vec<_> = rows.iter().map(|r| r.summary.as_str()).collect();
        assert_eq!(summaries, vec!["a", "b", "c, d"]);
    }

    #[test]
    fn compression_ignores_year() {
        let events = vec![
            event(2024, 12, 31, 60, "old year"),
            event(2025, 12, 31, 60, "new year"),
        ];
        let rows = RowCompressor::new(true).rows(&events);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].summary, "old year, new year");
    }

    #[test]
    fn hour_sums_match_in_both_modes() {
        let events = vec![
            event(2025, 3, 3, 25, "a"),
            event(2025, 3, 3, 50, "b"),
            event(2025, 3, 4, 15, "c"),
            event(2025, 3, 3, 10, "d"),
            event(2025, 3, 5, 95, "e"),
            event(2025, 3, 5, 5, "f"),
        ];
        let expected: f64 = events.iter().map(ClassifiedEvent::hours).sum();
        let plain = RowCompressor::new(false).rows(&events);
        let merged = RowCompressor::new(true).rows(&events);
        assert_eq!(plain.len(), 6);
        assert_eq!(merged.len(), 4);
        assert!((total_hours(&plain) - expected).abs() < 1e-9);
        assert!((total_hours(&merged) - expected).abs() < 1e-9);
    }

    #[test]
    fn empty_input_yields_no_rows() {
        assert!(RowCompressor::new(true).rows(&[]).is_empty());
        assert!(RowCompressor::default().rows(&[]).is_empty());
    }

    #[test]
    fn fractional_minutes_are_kept() {
        let mut e = event(2025, 3, 4, 0, "short");
        e.duration = Duration::seconds(90);
        let rows = RowCompressor::new(false).rows(&[e]);
        assert!((rows[0].hours - 0.025).abs() < 1e-12);
    }
}
