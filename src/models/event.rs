//! Event model.
//!
//! An event is a named, dated time slot that may depend on other events.
//!
//! # Time Representation
//! Dates are `"YYYY-MM-DD"` strings and times are `"HH:MM"` strings.
//! Both are compared lexicographically, which matches chronological order
//! for zero-padded values. No timezone or calendar arithmetic is applied.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Identifier of an event. Assigned by the scheduler's id generator.
pub type EventId = u64;

/// A scheduled event.
///
/// Events are ordered by [`EventKey`] (date, start, end). Two events with
/// the same key are considered duplicates by the index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier.
    pub id: EventId,
    /// Display name.
    pub name: String,
    /// Calendar date, `"YYYY-MM-DD"`.
    pub date: String,
    /// Start time, `"HH:MM"` (inclusive).
    pub start_time: String,
    /// End time, `"HH:MM"` (exclusive).
    pub end_time: String,
    /// Ids of events this event depends on.
    pub dependencies: BTreeSet<EventId>,
}

/// Ordering key of an event: `(date, start, end)`, lexicographic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventKey {
    pub date: String,
    pub start_time: String,
    pub end_time: String,
}

impl EventKey {
    /// Creates a key from its parts.
    pub fn new(
        date: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            start_time: start_time.into(),
            end_time: end_time.into(),
        }
    }

    pub(crate) fn as_tuple(&self) -> (&str, &str, &str) {
        (&self.date, &self.start_time, &self.end_time)
    }
}

impl std::fmt::Display for EventKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}-{}", self.date, self.start_time, self.end_time)
    }
}

impl Event {
    /// Creates a new event with no dependencies.
    pub fn new(
        id: EventId,
        name: impl Into<String>,
        date: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            date: date.into(),
            start_time: start_time.into(),
            end_time: end_time.into(),
            dependencies: BTreeSet::new(),
        }
    }

    /// Adds a dependency on another event.
    pub fn with_dependency(mut self, id: EventId) -> Self {
        self.dependencies.insert(id);
        self
    }

    /// Returns the ordering key of this event.
    pub fn key(&self) -> EventKey {
        EventKey::new(&self.date, &self.start_time, &self.end_time)
    }

    /// Compares two events by `(date, start, end)` without allocating a key.
    pub fn cmp_key(&self, other: &Self) -> Ordering {
        self.cmp_to_key(&other.key_ref())
    }

    pub(crate) fn key_ref(&self) -> (&str, &str, &str) {
        (&self.date, &self.start_time, &self.end_time)
    }

    pub(crate) fn cmp_to_key(&self, key: &(&str, &str, &str)) -> Ordering {
        self.key_ref().cmp(key)
    }

    /// Whether the `[start, end)` intervals of two events on the same date overlap.
    ///
    /// Touching endpoints (`self.end == other.start`) are not an overlap.
    /// Events on different dates never overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.date == other.date
            && !(self.end_time <= other.start_time || self.start_time >= other.end_time)
    }

    /// Whether the start time is strictly before the end time.
    #[inline]
    pub fn has_valid_range(&self) -> bool {
        self.start_time < self.end_time
    }
}
