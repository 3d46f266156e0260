//! Whole-batch timesheet generation.
//!
//! A single pass over the event batch: resolve every event, group the
//! classified ones by client, then turn each client's list into rows.

use std::collections::BTreeMap;

use chrono::Duration;
use serde::Serialize;

use crate::compress::{OutputRow, RowCompressor};
use crate::event::CalendarEvent;
use crate::index::ClientEventMap;
use crate::registry::{ClientFilter, ClientRegistry};
use crate::resolver::{EventResolver, Exclusion, ExclusionReason, Resolution, Unattributable};
use crate::types::ClientId;

/// Run-wide inputs for building a timesheet.
#[derive(Debug, Clone)]
pub struct TimesheetConfig {
    pub registry: ClientRegistry,
    /// Restricts the run to these clients when present.
    pub filter: Option<ClientFilter>,
    /// Email of the person whose declines are honoured.
    pub self_email: String,
    /// Merge adjacent same-day events into one row.
    pub compress: bool,
}

/// Total time for one client that had at least one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientTotal {
    pub client: ClientId,
    pub event_count: usize,
    #[serde(rename = "duration_seconds", serialize_with = "serialize_seconds")]
    pub duration: Duration,
}

/// Result of one timesheet run.
#[derive(Debug, Clone)]
pub struct TimesheetReport {
    /// Classified events per client; every registered client is present.
    pub events: ClientEventMap,
    /// Output rows per client, in the same order as `events`.
    pub rows: BTreeMap<ClientId, Vec<OutputRow>>,
    /// Events whose client could not be determined.
    pub unattributable: Vec<Unattributable>,
    /// How many events were dropped, per reason.
    pub excluded: BTreeMap<ExclusionReason, usize>,
}

impl TimesheetReport {
    /// Builds the report for a batch of events, ordered by start time.
    pub fn build(events: &[CalendarEvent], config: &TimesheetConfig) -> Self {
        let resolver =
            EventResolver::new(&config.registry, config.filter.as_ref(), &config.self_email);
        let mut index = ClientEventMap::for_registry(&config.registry);
        let mut unattributable = Vec::new();
        let mut excluded: BTreeMap<ExclusionReason, usize> = BTreeMap::new();

        for event in events {
            match resolver.resolve(event) {
                Resolution::Classified(classified) => {
                    tracing::debug!(event = %event.id, client = %classified.client, "classified event");
                    index.push(classified);
                }
                Resolution::Excluded(exclusion) => {
                    let reason = exclusion.reason();
                    *excluded.entry(reason).or_insert(0) += 1;
                    match exclusion {
                        Exclusion::Unattributable(diagnostic) => {
                            tracing::warn!(event = %event.id, "{diagnostic}");
                            unattributable.push(diagnostic);
                        }
                        Exclusion::Malformed => {}
                        _ => tracing::debug!(event = %event.id, %reason, "excluded event"),
                    }
                }
            }
        }

        let compressor = RowCompressor::new(config.compress);
        let rows = index
            .iter()
            .map(|(client, events)| (client.clone(), compressor.rows(events)))
            .collect();

        Self {
            events: index,
            rows,
            unattributable,
            excluded,
        }
    }

    /// Per-client totals, omitting clients without events.
    pub fn totals(&self) -> Vec<ClientTotal> {
        self.events
            .non_empty()
            .map(|(client, events)| ClientTotal {
                client: client.clone(),
                event_count: events.len(),
                duration: self.events.total_duration(client),
            })
            .collect()
    }

    /// Rows for one client; empty when the client had no events.
    pub fn rows_for(&self, client: &ClientId) -> &[OutputRow] {
        self.rows.get(client).map(Vec::as_slice).unwrap_or_default()
    }

    /// Number of events dropped for `reason`.
    pub fn excluded_count(&self, reason: ExclusionReason) -> usize {
        self.excluded.get(&reason).copied().unwrap_or(0)
    }
}

fn serialize_seconds<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_i64(duration.num_seconds())
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;
    use crate::event::{Attendee, ResponseStatus};
    use crate::types::EventId;

    const ME: &str = "me@example.com";

    fn config(compress: bool) -> TimesheetConfig {
        TimesheetConfig {
            registry: ClientRegistry::from_names(["clienta", "mosaik", "globex"]).unwrap(),
            filter: None,
            self_email: ME.to_string(),
            compress,
        }
    }

    fn event(id: &str, start: &str, end: &str, summary: &str, organizer: &str) -> CalendarEvent {
        CalendarEvent {
            id: EventId::new(id).unwrap(),
            start: Some(DateTime::parse_from_rfc3339(start).unwrap()),
            end: Some(DateTime::parse_from_rfc3339(end).unwrap()),
            summary: summary.to_string(),
            organizer: Some(organizer.to_string()),
            attendees: Vec::new(),
            raw: serde_json::Value::Null,
        }
    }

    fn clienta() -> ClientId {
        ClientId::new("clienta").unwrap()
    }

    fn standup_and_review() -> Vec<CalendarEvent> {
        vec![
            event(
                "1",
                "2025-03-04T09:00:00-05:00",
                "2025-03-04T09:30:00-05:00",
                "ClientA standup",
                "pm@example.com",
            ),
            event(
                "2",
                "2025-03-04T10:00:00-05:00",
                "2025-03-04T11:00:00-05:00",
                "ClientA review",
                "pm@example.com",
            ),
        ]
    }

    #[test]
    fn same_day_events_merge_when_compressing() {
        let report = TimesheetReport::build(&standup_and_review(), &config(true));
        let rows = report.rows_for(&clienta());
        assert_eq!(rows.len(), 1);
        assert!((rows[0].hours - 1.5).abs() < f64::EPSILON);
        assert_eq!(rows[0].summary, "clienta standup, clienta review");
    }

    #[test]
    fn same_day_events_stay_separate_without_compression() {
        let report = TimesheetReport::build(&standup_and_review(), &config(false));
        let hours: Vec<_> = report.rows_for(&clienta()).iter().map(|r| r.hours).collect();
        assert_eq!(hours, vec![0.5, 1.0]);
    }

    #[test]
    fn cancelled_event_produces_no_rows() {
        let events = vec![event(
            "1",
            "2025-03-04T09:00:00-05:00",
            "2025-03-04T09:30:00-05:00",
            "Sync - Cancelled",
            "bob@clienta.com",
        )];
        let report = TimesheetReport::build(&events, &config(true));
        assert!(report.rows.values().all(Vec::is_empty));
        assert_eq!(report.excluded_count(ExclusionReason::Cancelled), 1);
        assert!(report.totals().is_empty());
    }

    #[test]
    fn organizer_domain_resolves_client() {
        let events = vec![event(
            "1",
            "2025-03-04T09:00:00-05:00",
            "2025-03-04T10:00:00-05:00",
            "Weekly sync",
            "bob.smith@clienta.com",
        )];
        let report = TimesheetReport::build(&events, &config(false));
        assert_eq!(report.rows_for(&clienta()).len(), 1);
        assert_eq!(report.rows_for(&clienta())[0].summary, "weekly sync");
    }

    #[test]
    fn every_registry_client_is_present() {
        let report = TimesheetReport::build(&standup_and_review(), &config(false));
        assert_eq!(report.events.client_count(), 3);
        assert_eq!(report.rows.len(), 3);
        assert!(report.rows_for(&ClientId::new("globex").unwrap()).is_empty());
    }

    #[test]
    fn totals_cover_only_busy_clients_and_ignore_compression() {
        let mut events = standup_and_review();
        events.push(event(
            "3",
            "2025-03-05T13:00:00-05:00",
            "2025-03-05T13:45:00-05:00",
            "mosaik: design",
            "pm@example.com",
        ));
        for compress in [false, true] {
            let report = TimesheetReport::build(&events, &config(compress));
            let totals = report.totals();
            assert_eq!(
                totals,
                vec![
                    ClientTotal {
                        client: clienta(),
                        event_count: 2,
                        duration: Duration::minutes(90),
                    },
                    ClientTotal {
                        client: ClientId::new("mosaik").unwrap(),
                        event_count: 1,
                        duration: Duration::minutes(45),
                    },
                ]
            );
        }
    }

    #[test]
    fn diagnostics_and_exclusions_are_recorded() {
        let mut declined = event(
            "4",
            "2025-03-04T12:00:00-05:00",
            "2025-03-04T13:00:00-05:00",
            "clienta lunch",
            "bob@clienta.com",
        );
        declined.attendees.push(Attendee {
            email: ME.to_string(),
            response_status: ResponseStatus::Declined,
        });
        let mut all_day = event(
            "5",
            "2025-03-04T00:00:00-05:00",
            "2025-03-05T00:00:00-05:00",
            "Holiday",
            "hr@initech.com",
        );
        all_day.start = None;
        all_day.end = None;
        let events = vec![
            declined,
            all_day,
            event(
                "6",
                "2025-03-04T15:00:00-05:00",
                "2025-03-04T16:00:00-05:00",
                "Dentist",
                "me@gmail.com",
            ),
        ];

        let report = TimesheetReport::build(&events, &config(false));
        assert_eq!(report.excluded_count(ExclusionReason::Declined), 1);
        assert_eq!(report.excluded_count(ExclusionReason::Malformed), 1);
        assert_eq!(report.excluded_count(ExclusionReason::Unattributable), 1);
        assert_eq!(
            report.unattributable,
            vec![Unattributable {
                candidate: Some("gmail".to_string()),
                summary: "Dentist".to_string(),
            }]
        );
        assert_eq!(report.events.event_count(), 0);
    }

    #[test]
    fn filter_narrows_without_diagnostics() {
        let mut config = config(false);
        config.filter = Some(ClientFilter::parse_list("mosaik").unwrap());
        let report = TimesheetReport::build(&standup_and_review(), &config);
        assert!(report.rows_for(&clienta()).is_empty());
        assert!(report.unattributable.is_empty());
        assert_eq!(report.excluded_count(ExclusionReason::FilteredOut), 2);
        assert_eq!(report.events.client_count(), 3);
    }

    #[test]
    fn rebuilding_is_idempotent() {
        let events = standup_and_review();
        let first = TimesheetReport::build(&events, &config(true));
        let second = TimesheetReport::build(&events, &config(true));
        assert_eq!(first.events, second.events);
        assert_eq!(first.rows, second.rows);
    }

    #[test]
    fn totals_serialize_seconds() {
        let report = TimesheetReport::build(&standup_and_review(), &config(false));
        let json = serde_json::to_value(report.totals()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"client": "clienta", "event_count": 2, "duration_seconds": 5400}])
        );
    }

    #[test]
    fn totals_keep_sub_minute_durations() {
        let events = vec![event(
            "1",
            "2025-03-04T09:00:00-05:00",
            "2025-03-04T09:01:30-05:00",
            "ClientA quick call",
            "pm@example.com",
        )];
        let report = TimesheetReport::build(&events, &config(false));
        let json = serde_json::to_value(report.totals()).unwrap();
        assert_eq!(json[0]["duration_seconds"], 90);
    }
}
