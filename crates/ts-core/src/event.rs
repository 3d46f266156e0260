//! Calendar events as read from the provider, and their classified form.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::types::{ClientId, EventId, ValidationError};

/// A calendar entry as returned by the calendar provider.
///
/// Start and end are absent for all-day entries (and for malformed ones).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Provider identifier for this event.
    pub id: EventId,
    #[serde(default)]
    pub start: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub end: Option<DateTime<FixedOffset>>,
    /// Free-text title, as entered.
    #[serde(default)]
    pub summary: String,
    /// Email address of the organizer, if the provider supplied one.
    #[serde(default)]
    pub organizer: Option<String>,
    #[serde(default)]
    pub attendees: Vec<Attendee>,
    /// The original provider record, kept for diagnostics.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub raw: serde_json::Value,
}

impl CalendarEvent {
    /// Returns the attendee record whose email matches `email`.
    ///
    /// Email addresses compare ASCII case-insensitively.
    pub fn attendee(&self, email: &str) -> Option<&Attendee> {
        self.attendees
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email))
    }

    /// Whether the attendee identified by `email` declined the invitation.
    ///
    /// No matching attendee record means the event was not declined.
    pub fn declined_by(&self, email: &str) -> bool {
        self.attendee(email)
            .is_some_and(|a| a.response_status == ResponseStatus::Declined)
    }
}

/// One invitee of a calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub email: String,
    #[serde(default)]
    pub response_status: ResponseStatus,
}

/// An attendee's answer to an invitation.
///
/// Unrecognized provider values are preserved in `Other` rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum ResponseStatus {
    Accepted,
    Declined,
    Tentative,
    #[default]
    NeedsAction,
    Other(String),
}

impl ResponseStatus {
    /// Provider string for this status.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::Tentative => "tentative",
            Self::NeedsAction => "needsAction",
            Self::Other(value) => value,
        }
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResponseStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            "tentative" => Ok(Self::Tentative),
            "needsAction" => Ok(Self::NeedsAction),
            "" => Err(ValidationError::InvalidResponseStatus {
                value: s.to_string(),
            }),
            other => Ok(Self::Other(other.to_string())),
        }
    }
}

impl Serialize for ResponseStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ResponseStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// An eligible event attributed to a client.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedEvent {
    /// Calendar day of the start timestamp, in the event's own offset.
    pub date: NaiveDate,
    /// `end - start`, never negative.
    pub duration: Duration,
    /// Lower-cased summary.
    pub summary: String,
    pub client: ClientId,
    pub original: CalendarEvent,
}

impl ClassifiedEvent {
    /// Duration in decimal hours.
    #[expect(
        clippy::cast_precision_loss,
        reason = "calendar durations are far below f64's exact integer range"
    )]
    pub fn hours(&self) -> f64 {
        self.duration.num_milliseconds() as f64 / 3_600_000.0
    }
}

impl fmt::Display for ClassifiedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Desc: {}, Date: {}, Duration: {}",
            self.summary,
            self.original
                .start
                .map_or_else(|| self.date.to_string(), |s| s.format("%Y-%m-%d %H:%M").to_string()),
            format_duration(self.duration)
        )
    }
}

/// Formats a duration as `h:mm:ss`; negative durations render as `0:00:00`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours}:{minutes:02}:{seconds:02}")
}
