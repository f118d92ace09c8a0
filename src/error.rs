//! Error types for scheduler operations.

use thiserror::Error;

use crate::models::EventId;
use crate::validation::ValidationError;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ScheduleError>;

/// Errors reported by the scheduler facade.
///
/// None of these are retried internally. The caller decides whether to
/// ask for new input.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Event '{candidate}' conflicts with existing events {conflicting:?}")]
    ConflictDetected {
        candidate: String,
        conflicting: Vec<EventId>,
    },

    #[error("An event already occupies {date} {start}-{end}")]
    DuplicateKey {
        date: String,
        start: String,
        end: String,
    },

    #[error("Event id {0} is already in use")]
    DuplicateId(EventId),

    #[error("Event not found: {0}")]
    NotFound(EventId),

    #[error("Dependency {from} -> {to} would create a cycle")]
    CycleRejected { from: EventId, to: EventId },

    #[error("Dependency graph contains a cycle")]
    CycleDetected,

    #[error("Unknown event in dependency: {0}")]
    UnknownVertex(EventId),

    #[error("Invalid {field}: '{value}'")]
    InvalidField { field: &'static str, value: String },

    #[error("Start time {start} is not before end time {end}")]
    InvalidTimeRange { start: String, end: String },

    #[error("No event id left after {0}")]
    IdExhausted(EventId),

    #[error("Malformed record on line {line}: {reason}")]
    Record { line: usize, reason: String },

    #[error("Record set failed validation ({} problems)", .0.len())]
    Validation(Vec<ValidationError>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScheduleError {
    pub(crate) fn invalid_field(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ScheduleError::CycleRejected { from: 2, to: 1 };
        assert_eq!(err.to_string(), "Dependency 2 -> 1 would create a cycle");

        let err = ScheduleError::invalid_field("date", "2024/01/01");
        assert_eq!(err.to_string(), "Invalid date: '2024/01/01'");

        let err = ScheduleError::Record {
            line: 3,
            reason: "missing end time".into(),
        };
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err: ScheduleError = io.into();
        assert!(matches!(err, ScheduleError::Io(_)));
    }
}
