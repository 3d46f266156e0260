//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Invalid attendee response status value.
    #[error("invalid response status: {value}")]
    InvalidResponseStatus { value: String },
}

/// Generates a validated string ID newtype with common trait implementations.
///
/// The `normalize` function is applied before validation, so two inputs that
/// normalize to the same text produce equal IDs.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal, $normalize:expr
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after normalization and validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let normalize: fn(String) -> String = $normalize;
                let id = normalize(id.into());
                if id.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated calendar event identifier.
    ///
    /// Opaque reference back to the record the calendar provider returned.
    EventId, "event ID", |id| id
);

define_string_id!(
    /// A billing client name.
    ///
    /// Client names compare case-insensitively, so the value is stored
    /// trimmed and lower-cased. `ClientId::new("ClientA")` and
    /// `ClientId::new("clienta")` are equal.
    ClientId, "client ID", |id| id.trim().to_lowercase()
);
