//! Per-event eligibility and client attribution.
//!
//! # Rules
//!
//! An event is excluded, in this order, when:
//! 1. it has no start or no end timestamp (all-day or malformed),
//! 2. its summary mentions "cancelled" or "canceled",
//! 3. the self identity declined it.
//!
//! Eligible events are attributed to the first summary token that names a
//! registered client, falling back to the organizer's email domain. A name
//! outside the registry makes the event unattributable; a registered client
//! outside the active filter is dropped quietly.

use std::fmt;

use crate::event::{CalendarEvent, ClassifiedEvent};
use crate::registry::{ClientFilter, ClientRegistry};
use crate::types::ClientId;

const SUMMARY_DELIMITERS: &[char] = &[' ', ':', '-', '.', '<', '>', ','];
const CANCELLED_MARKERS: &[&str] = &["cancelled", "canceled"];

/// Why an event did not make it into the timesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclusion {
    /// Missing start or end timestamp.
    Malformed,
    Cancelled,
    /// The self identity declined the invitation.
    Declined,
    /// The resolved name is not a registered client.
    Unattributable(Unattributable),
    /// A registered client that the run's filter leaves out.
    FilteredOut { client: ClientId },
}

impl Exclusion {
    /// Short reason class, used for logging and counting.
    pub const fn reason(&self) -> ExclusionReason {
        match self {
            Self::Malformed => ExclusionReason::Malformed,
            Self::Cancelled => ExclusionReason::Cancelled,
            Self::Declined => ExclusionReason::Declined,
            Self::Unattributable(_) => ExclusionReason::Unattributable,
            Self::FilteredOut { .. } => ExclusionReason::FilteredOut,
        }
    }
}

/// Reason class of an [`Exclusion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExclusionReason {
    Malformed,
    Cancelled,
    Declined,
    Unattributable,
    FilteredOut,
}

impl ExclusionReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::Cancelled => "cancelled",
            Self::Declined => "declined",
            Self::Unattributable => "unattributable",
            Self::FilteredOut => "filtered-out",
        }
    }
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic for an event whose client could not be determined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unattributable {
    /// Name the fallback produced, if the organizer email yielded one.
    pub candidate: Option<String>,
    /// The event summary as entered.
    pub summary: String,
}

impl fmt::Display for Unattributable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cannot find client {} for event [{}]",
            self.candidate.as_deref().unwrap_or("<none>"),
            self.summary
        )
    }
}

/// Outcome of resolving one event.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Classified(ClassifiedEvent),
    Excluded(Exclusion),
}

/// Decides whether events count, and for which client.
#[derive(Debug, Clone, Copy)]
pub struct EventResolver<'a> {
    registry: &'a ClientRegistry,
    filter: Option<&'a ClientFilter>,
    self_email: &'a str,
}

impl<'a> EventResolver<'a> {
    pub const fn new(
        registry: &'a ClientRegistry,
        filter: Option<&'a ClientFilter>,
        self_email: &'a str,
    ) -> Self {
        Self {
            registry,
            filter,
            self_email,
        }
    }

    /// Resolves a single event.
    pub fn resolve(&self, event: &CalendarEvent) -> Resolution {
        let (Some(start), Some(end)) = (event.start, event.end) else {
            return Resolution::Excluded(Exclusion::Malformed);
        };

        let summary = event.summary.to_lowercase();
        if is_cancelled(&summary) {
            return Resolution::Excluded(Exclusion::Cancelled);
        }

        if event.declined_by(self.self_email) {
            return Resolution::Excluded(Exclusion::Declined);
        }

        let client = match self.attribute(&summary, event.organizer.as_deref()) {
            Ok(client) => client,
            Err(candidate) => {
                return Resolution::Excluded(Exclusion::Unattributable(Unattributable {
                    candidate,
                    summary: event.summary.clone(),
                }));
            }
        };

        if self.filter.is_some_and(|filter| !filter.allows(&client)) {
            return Resolution::Excluded(Exclusion::FilteredOut { client });
        }

        Resolution::Classified(ClassifiedEvent {
            date: start.date_naive(),
            duration: (end - start).max(chrono::Duration::zero()),
            summary,
            client,
            original: event.clone(),
        })
    }

    /// Attributes a lower-cased summary to a registered client.
    ///
    /// On failure returns the fallback candidate name (if any) that missed.
    pub fn attribute(
        &self,
        summary: &str,
        organizer: Option<&str>,
    ) -> Result<ClientId, Option<String>> {
        if let Some(client) = tokenize_summary(summary).find_map(|token| self.registry.lookup(token)) {
            return Ok(client.clone());
        }

        let candidate = organizer.and_then(client_from_organizer);
        candidate
            .as_deref()
            .and_then(|name| self.registry.lookup(name))
            .cloned()
            .ok_or(candidate)
    }
}

/// Whether a lower-cased summary marks the event as cancelled.
pub fn is_cancelled(summary: &str) -> bool {
    CANCELLED_MARKERS
        .iter()
        .any(|marker| summary.contains(marker))
}

/// Splits a summary into candidate client tokens.
///
/// Empty tokens between adjacent delimiters are kept; they never match a client.
pub fn tokenize_summary(summary: &str) -> impl Iterator<Item = &str> {
    summary.split(SUMMARY_DELIMITERS)
}

/// Guesses a client name from an organizer email address.
///
/// Splits on `.` and `@` and takes the second-to-last component, so
/// `bob.smith@clienta.com` yields `clienta`.
pub fn client_from_organizer(email: &str) -> Option<String> {
    let components: Vec<&str> = email.split(['.', '@']).collect();
    let index = components.len().checked_sub(2)?;
    Some(components[index].to_lowercase())
}
