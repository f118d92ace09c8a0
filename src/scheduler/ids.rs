//! Event id allocation.

use crate::error::{Result, ScheduleError};
use crate::models::EventId;

/// Monotonic event id generator owned by the scheduler.
///
/// Ids are only consumed when an event is actually stored, so a rejected
/// creation does not burn an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdGenerator {
    next: EventId,
}

impl IdGenerator {
    /// Creates a generator whose first id is `first`.
    pub fn starting_at(first: EventId) -> Self {
        Self { next: first }
    }

    /// The id the next stored event will receive.
    #[inline]
    pub fn peek(&self) -> EventId {
        self.next
    }

    /// Consumes and returns the next id.
    ///
    /// Fails with [`ScheduleError::IdExhausted`] when the id has no
    /// successor; the generator is left unchanged.
    pub fn allocate(&mut self) -> Result<EventId> {
        let id = self.next;
        self.next = successor(id)?;
        Ok(id)
    }

    /// Moves past `id` so it is never handed out again.
    pub fn observe(&mut self, id: EventId) -> Result<()> {
        if id >= self.next {
            self.next = successor(id)?;
        }
        Ok(())
    }
}

fn successor(id: EventId) -> Result<EventId> {
    id.checked_add(1).ok_or(ScheduleError::IdExhausted(id))
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::starting_at(1)
    }
}
