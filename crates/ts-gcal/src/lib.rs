//! Google Calendar integration for the timesheet builder.
//!
//! Fetches one page of events from the Calendar v3 `events.list` endpoint and
//! converts them into [`ts_core::CalendarEvent`]s. Obtaining the OAuth access
//! token is left to the caller.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;
use ts_core::{Attendee, CalendarEvent, EventId, ResponseStatus};

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3/";
/// Events requested per call. Paging is not followed.
const MAX_RESULTS: u32 = 200;

/// Calendar client errors.
#[derive(Debug, Error)]
pub enum GcalError {
    /// The provided access token was invalid.
    #[error("invalid access token: {reason}")]
    InvalidToken { reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// API returned an error response.
    #[error("API error: {message}")]
    Api { message: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Google Calendar API client.
///
/// # Thread Safety
///
/// The client is safe to clone and share across threads. Each clone shares
/// the underlying HTTP connection pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    access_token: String,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("access_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a new client with the given OAuth access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is empty or whitespace-only, or if
    /// the HTTP client fails to build.
    pub fn new(access_token: impl Into<String>) -> Result<Self, GcalError> {
        let access_token = access_token.into();

        if access_token.is_empty() {
            return Err(GcalError::InvalidToken {
                reason: "access token cannot be empty",
            });
        }
        if access_token.trim().is_empty() {
            return Err(GcalError::InvalidToken {
                reason: "access token cannot be whitespace-only",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(GcalError::ClientBuild)?;

        Ok(Self { http, access_token })
    }

    /// Lists events of a calendar that overlap `[time_min, time_max)`.
    ///
    /// Recurring events are expanded into instances, deleted events are
    /// omitted, and results are ordered by start time.
    pub async fn list_events(
        &self,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, GcalError> {
        let url = events_url(calendar_id)?;
        let query = list_query(time_min, time_max);
        tracing::debug!(%url, ?query, "listing calendar events");

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(parse_api_error(&body).unwrap_or_else(|| GcalError::Api {
                message: format!("status {status}: {body}"),
            }));
        }

        let events = parse_events_response(&body)?;
        tracing::debug!(count = events.len(), "fetched calendar events");
        Ok(events)
    }
}

/// Builds the `events.list` URL, escaping the calendar ID as a path segment.
fn events_url(calendar_id: &str) -> Result<Url, GcalError> {
    let mut url =
        Url::parse(CALENDAR_API_BASE).map_err(|err| GcalError::InvalidResponse(err.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| GcalError::InvalidResponse("API base URL cannot have segments".to_string()))?
        .pop_if_empty()
        .extend(["calendars", calendar_id, "events"]);
    Ok(url)
}

fn list_query(time_min: DateTime<Utc>, time_max: DateTime<Utc>) -> Vec<(&'static str, String)> {
    vec![
        ("timeMin", time_min.to_rfc3339_opts(SecondsFormat::Secs, true)),
        ("timeMax", time_max.to_rfc3339_opts(SecondsFormat::Secs, true)),
        ("showDeleted", "false".to_string()),
        ("singleEvents", "true".to_string()),
        ("maxResults", MAX_RESULTS.to_string()),
        ("orderBy", "startTime".to_string()),
    ]
}

#[derive(Debug, Deserialize)]
struct EventsPage {
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEvent {
    id: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    start: Option<GoogleTime>,
    #[serde(default)]
    end: Option<GoogleTime>,
    #[serde(default)]
    organizer: Option<GooglePerson>,
    #[serde(default)]
    attendees: Vec<GooglePerson>,
}

/// `dateTime` for timed events; all-day events only carry `date`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleTime {
    #[serde(default)]
    date_time: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GooglePerson {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    response_status: Option<String>,
}

/// Parses an `events.list` response body.
///
/// Each event keeps its original JSON item in [`CalendarEvent::raw`].
pub fn parse_events_response(body: &str) -> Result<Vec<CalendarEvent>, GcalError> {
    let page: EventsPage =
        serde_json::from_str(body).map_err(|err| GcalError::InvalidResponse(err.to_string()))?;
    page.items.into_iter().map(convert_event).collect()
}

fn convert_event(raw: serde_json::Value) -> Result<CalendarEvent, GcalError> {
    let event: GoogleEvent = serde_json::from_value(raw.clone())
        .map_err(|err| GcalError::InvalidResponse(err.to_string()))?;
    let id = EventId::new(event.id).map_err(|err| GcalError::InvalidResponse(err.to_string()))?;

    let attendees = event
        .attendees
        .into_iter()
        .filter_map(|person| {
            let email = person.email?;
            let response_status = person
                .response_status
                .and_then(|status| status.parse::<ResponseStatus>().ok())
                .unwrap_or_default();
            Some(Attendee {
                email,
                response_status,
            })
        })
        .collect();

    Ok(CalendarEvent {
        id,
        start: event.start.and_then(|t| t.date_time),
        end: event.end.and_then(|t| t.date_time),
        summary: event.summary.unwrap_or_default(),
        organizer: event.organizer.and_then(|o| o.email),
        attendees,
        raw,
    })
}

fn parse_api_error(body: &str) -> Option<GcalError> {
    #[derive(Deserialize)]
    struct ErrorPayload {
        error: ErrorDetails,
    }

    #[derive(Deserialize)]
    struct ErrorDetails {
        message: String,
    }

    serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .map(|payload| GcalError::Api {
            message: payload.error.message,
        })
}
