//! Input validation for calendar events.
//!
//! Field checks run before an event is created or rescheduled. Record-set
//! checks run on a whole loaded file before anything is indexed, and
//! detect:
//! - Malformed names, dates and times
//! - Duplicate event IDs
//! - Two events sharing the same `(date, start, end)` slot
//! - Dependencies on events that don't exist
//! - Circular dependencies (DAG validation)
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

use crate::error::{Result, ScheduleError};
use crate::graph::DependencyGraph;
use crate::models::{Event, EventId, EventKey};

static DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern compiles"));
static TIME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}:\d{2}$").expect("time pattern compiles"));

/// Validation result.
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two events share the same ID.
    DuplicateId,
    /// Two events occupy the same `(date, start, end)` slot.
    DuplicateKey,
    /// A name, date or time is malformed.
    InvalidField,
    /// An event depends on an ID that doesn't exist.
    UnknownDependency,
    /// Dependency graph contains a cycle.
    CyclicDependency,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Whether `date` has the `YYYY-MM-DD` shape.
pub fn is_valid_date(date: &str) -> bool {
    DATE_PATTERN.is_match(date)
}

/// Whether `time` has the `HH:MM` shape.
pub fn is_valid_time(time: &str) -> bool {
    TIME_PATTERN.is_match(time)
}

/// Whether `name` can be stored in a record line.
///
/// Names must be non-empty and free of commas and line breaks, since the
/// record format has no escaping.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(|c: char| matches!(c, ',' | '\n' | '\r'))
}

/// Checks the name, date and time formats of a single event.
pub fn validate_fields(name: &str, date: &str, start: &str, end: &str) -> Result<()> {
    if !is_valid_name(name) {
        return Err(ScheduleError::invalid_field("name", name));
    }
    if !is_valid_date(date) {
        return Err(ScheduleError::invalid_field("date", date));
    }
    if !is_valid_time(start) {
        return Err(ScheduleError::invalid_field("start time", start));
    }
    if !is_valid_time(end) {
        return Err(ScheduleError::invalid_field("end time", end));
    }
    Ok(())
}

/// Checks that `start` is strictly before `end`.
pub fn validate_time_range(start: &str, end: &str) -> Result<()> {
    if start < end {
        Ok(())
    } else {
        Err(ScheduleError::InvalidTimeRange {
            start: start.to_string(),
            end: end.to_string(),
        })
    }
}

/// Validates a complete set of event records.
///
/// Checks:
/// 1. Every name, date and time is well-formed (when `check_formats`)
/// 2. No duplicate event IDs
/// 3. No two events share a `(date, start, end)` slot
/// 4. Every dependency points to an event in the set
/// 5. No circular dependencies
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_records(events: &[Event], check_formats: bool) -> ValidationResult {
    let mut errors = Vec::new();

    let mut ids: HashSet<EventId> = HashSet::new();
    let mut keys: HashMap<EventKey, EventId> = HashMap::new();

    for event in events {
        if check_formats {
            if let Err(err) =
                validate_fields(&event.name, &event.date, &event.start_time, &event.end_time)
            {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidField,
                    format!("Event {}: {err}", event.id),
                ));
            }
        }

        if !ids.insert(event.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate event ID: {}", event.id),
            ));
        }

        if let Some(other) = keys.insert(event.key(), event.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateKey,
                format!(
                    "Events {other} and {} both occupy {}",
                    event.id,
                    event.key()
                ),
            ));
        }
    }

    // Check dependency references
    for event in events {
        for dep in &event.dependencies {
            if !ids.contains(dep) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownDependency,
                    format!("Event {} depends on unknown event {dep}", event.id),
                ));
            }
        }
    }

    if let Some(cycle_err) = detect_cycles(events) {
        errors.push(cycle_err);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Detects cycles among the declared dependencies.
///
/// Builds a throwaway [`DependencyGraph`] with every edge written directly,
/// then runs its cycle check once.
fn detect_cycles(events: &[Event]) -> Option<ValidationError> {
    let mut graph = DependencyGraph::new();
    for event in events {
        graph.add_vertex(event.id);
    }
    for event in events {
        for &dep in &event.dependencies {
            graph.insert_edge_unchecked(event.id, dep);
        }
    }

    if graph.has_cycle() {
        Some(ValidationError::new(
            ValidationErrorKind::CyclicDependency,
            "Circular dependency detected among loaded events",
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_events() -> Vec<Event> {
        vec![
            Event::new(1, "Design", "2024-01-01", "09:00", "10:00"),
            Event::new(2, "Build", "2024-01-01", "10:00", "12:00").with_dependency(1),
            Event::new(3, "Ship", "2024-01-02", "09:00", "09:30").with_dependency(2),
        ]
    }

    #[test]
    fn test_date_and_time_formats() {
        assert!(is_valid_date("2024-01-31"));
        assert!(!is_valid_date("2024-1-31"));
        assert!(!is_valid_date("2024/01/31"));
        assert!(!is_valid_date("2024-01-31 "));
        assert!(is_valid_time("09:05"));
        assert!(!is_valid_time("9:05"));
        assert!(!is_valid_time("09:05:00"));
    }

    #[test]
    fn test_name_rules() {
        assert!(is_valid_name("Team sync"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("a,b"));
        assert!(!is_valid_name("line\nbreak"));
    }

    #[test]
    fn test_validate_fields_reports_field() {
        let err = validate_fields("Sync", "2024-01-01", "9:00", "10:00").unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::InvalidField { field: "start time", .. }
        ));
        assert!(validate_fields("Sync", "2024-01-01", "09:00", "10:00").is_ok());
    }

    #[test]
    fn test_time_range() {
        assert!(validate_time_range("09:00", "10:00").is_ok());
        assert!(matches!(
            validate_time_range("10:00", "10:00"),
            Err(ScheduleError::InvalidTimeRange { .. })
        ));
        assert!(validate_time_range("11:00", "10:00").is_err());
    }

    #[test]
    fn test_valid_records() {
        assert!(validate_records(&sample_events(), true).is_ok());
    }

    #[test]
    fn test_duplicate_id() {
        let mut events = sample_events();
        events.push(Event::new(1, "Again", "2024-02-01", "09:00", "10:00"));

        let errors = validate_records(&events, true).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId));
    }

    #[test]
    fn test_duplicate_key() {
        let mut events = sample_events();
        events.push(Event::new(9, "Clone", "2024-01-01", "09:00", "10:00"));

        let errors = validate_records(&events, true).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateKey && e.message.contains('9')));
    }

    #[test]
    fn test_unknown_dependency() {
        let events = vec![Event::new(1, "Solo", "2024-01-01", "09:00", "10:00").with_dependency(42)];

        let errors = validate_records(&events, true).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::UnknownDependency));
    }

    #[test]
    fn test_cyclic_dependency() {
        // 1 -> 3 -> 2 -> 1
        let mut events = sample_events();
        events[0].dependencies.insert(3);

        let errors = validate_records(&events, true).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::CyclicDependency));
    }

    #[test]
    fn test_format_checks_can_be_skipped() {
        let events = vec![Event::new(1, "Loose", "Jan 1", "9am", "10am")];
        assert!(validate_records(&events, false).is_ok());

        let errors = validate_records(&events, true).unwrap_err();
        assert!(errors
            .iter()
            .all(|e| e.kind == ValidationErrorKind::InvalidField));
    }

    #[test]
    fn test_multiple_errors() {
        let events = vec![
            Event::new(1, "A", "2024-01-01", "09:00", "10:00").with_dependency(7),
            Event::new(1, "B", "2024-01-01", "09:00", "10:00"),
        ];

        let errors = validate_records(&events, true).unwrap_err();
        assert!(errors.len() >= 3);
    }
}
