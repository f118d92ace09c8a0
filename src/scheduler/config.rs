//! Scheduler configuration.

use serde::{Deserialize, Serialize};

use crate::models::EventId;

/// Behaviour switches for [`EventScheduler`](super::EventScheduler).
///
/// Missing fields take their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Id handed to the first event of an empty calendar.
    pub first_id: EventId,
    /// Reject events whose start time is not before their end time.
    pub enforce_time_order: bool,
    /// Check name, date and time formats on create, update and load.
    pub validate_formats: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            first_id: 1,
            enforce_time_order: true,
            validate_formats: true,
        }
    }
}

impl SchedulerConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the first id of an empty calendar.
    pub fn with_first_id(mut self, first_id: EventId) -> Self {
        self.first_id = first_id;
        self
    }

    /// Enables or disables the `start < end` check.
    pub fn with_time_order_enforced(mut self, enforce: bool) -> Self {
        self.enforce_time_order = enforce;
        self
    }

    /// Enables or disables format validation.
    pub fn with_format_validation(mut self, validate: bool) -> Self {
        self.validate_formats = validate;
        self
    }
}
