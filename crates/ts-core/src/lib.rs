//! Core domain logic for the calendar timesheet builder.
//!
//! This crate contains:
//! - Resolution: deciding whether a calendar event is billable, and for which client
//! - Indexing: grouping classified events per client
//! - Compression: turning a client's events into timesheet rows
//! - Sheet writing: placing rows into a tabular store behind the [`SheetStore`] trait

mod compress;
pub mod event;
mod index;
pub mod registry;
mod report;
pub mod resolver;
pub mod sheet;
pub mod types;

pub use compress::{OutputRow, RowCompressor, date_label};
pub use event::{Attendee, CalendarEvent, ClassifiedEvent, ResponseStatus, format_duration};
pub use index::ClientEventMap;
pub use registry::{ClientFilter, ClientRegistry};
pub use report::{ClientTotal, TimesheetConfig, TimesheetReport};
pub use resolver::{EventResolver, Exclusion, ExclusionReason, Resolution, Unattributable};
pub use sheet::{SheetRange, SheetStore, SheetWrite, WriteError, WriteSummary, write_timesheet};
pub use types::{ClientId, EventId, ValidationError};
