//! Scheduler facade.
//!
//! `EventScheduler` composes the [`EventIndex`] and the
//! [`DependencyGraph`] and keeps them in step: every event stored in the
//! index is a vertex of the graph, and every accepted edge is mirrored in
//! the source event's `dependencies` set.
//!
//! # Operations
//!
//! | Operation | Failure modes |
//! |-----------|---------------|
//! | `create_event` | `InvalidField`, `InvalidTimeRange`, `ConflictDetected`, `DuplicateKey`, `IdExhausted` |
//! | `update_event` | same as create; unknown id is a no-op |
//! | `delete_event` | `NotFound` |
//! | `add_dependency` | `CycleRejected`, `UnknownVertex` |
//! | `topological_order` | `CycleDetected` |

use std::io::{BufRead, Write};

use tracing::{debug, info, warn};

use super::{IdGenerator, SchedulerConfig};
use crate::error::{Result, ScheduleError};
use crate::export;
use crate::graph::{DependencyGraph, EdgeOutcome};
use crate::index::{EventIndex, InsertOutcome, Iter};
use crate::models::{Event, EventId};
use crate::record;
use crate::validation;

/// Field changes for [`EventScheduler::update_event`].
///
/// `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventUpdate {
    pub name: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl EventUpdate {
    /// Creates an update that changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a new name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets a new date.
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Sets a new start time.
    pub fn with_start_time(mut self, start: impl Into<String>) -> Self {
        self.start_time = Some(start.into());
        self
    }

    /// Sets a new end time.
    pub fn with_end_time(mut self, end: impl Into<String>) -> Self {
        self.end_time = Some(end.into());
        self
    }

    /// Whether the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && !self.touches_key()
    }

    /// Whether the update touches date, start or end.
    pub fn touches_key(&self) -> bool {
        self.date.is_some() || self.start_time.is_some() || self.end_time.is_some()
    }

    fn apply(&self, event: &mut Event) {
        if let Some(name) = &self.name {
            event.name.clone_from(name);
        }
        if let Some(date) = &self.date {
            event.date.clone_from(date);
        }
        if let Some(start) = &self.start_time {
            event.start_time.clone_from(start);
        }
        if let Some(end) = &self.end_time {
            event.end_time.clone_from(end);
        }
    }
}

/// Calendar of events with dependency tracking.
///
/// # Example
///
/// ```
/// use event_schedule::scheduler::EventScheduler;
///
/// let mut calendar = EventScheduler::new();
/// let design = calendar.create_event("Design", "2024-01-01", "09:00", "10:00").unwrap();
/// let build = calendar.create_event("Build", "2024-01-01", "10:00", "12:00").unwrap();
/// calendar.add_dependency(build, design).unwrap();
///
/// assert_eq!(calendar.topological_order().unwrap(), vec![design, build]);
/// ```
#[derive(Debug, Clone)]
pub struct EventScheduler {
    index: EventIndex,
    graph: DependencyGraph,
    ids: IdGenerator,
    config: SchedulerConfig,
}

impl Default for EventScheduler {
    fn default() -> Self {
        Self::with_config(SchedulerConfig::default())
    }
}

impl EventScheduler {
    /// Creates an empty calendar with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty calendar.
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            index: EventIndex::new(),
            graph: DependencyGraph::new(),
            ids: IdGenerator::starting_at(config.first_id),
            config,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// The ordered event index.
    pub fn index(&self) -> &EventIndex {
        &self.index
    }

    /// The dependency graph.
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the calendar is empty.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Id the next created event will receive.
    pub fn next_id(&self) -> EventId {
        self.ids.peek()
    }

    /// Looks up an event by id.
    pub fn get(&self, id: EventId) -> Option<&Event> {
        self.index.get(id)
    }

    /// All events in chronological `(date, start, end)` order.
    pub fn events(&self) -> Iter<'_> {
        self.index.iter()
    }

    fn check_fields(&self, event: &Event) -> Result<()> {
        if self.config.validate_formats {
            validation::validate_fields(&event.name, &event.date, &event.start_time, &event.end_time)?;
        }
        if self.config.enforce_time_order {
            validation::validate_time_range(&event.start_time, &event.end_time)?;
        }
        Ok(())
    }

    fn conflicting_ids(&self, candidate: &Event, skip: Option<EventId>) -> Vec<EventId> {
        self.index
            .conflicts(candidate)
            .map(|other| other.id)
            .filter(|&id| Some(id) != skip)
            .collect()
    }

    fn insert_error(outcome: InsertOutcome, event: &Event) -> ScheduleError {
        match outcome {
            InsertOutcome::DuplicateId => ScheduleError::DuplicateId(event.id),
            _ => ScheduleError::DuplicateKey {
                date: event.date.clone(),
                start: event.start_time.clone(),
                end: event.end_time.clone(),
            },
        }
    }

    /// Creates an event after checking it against every stored event.
    ///
    /// The id is only consumed when the event is stored. Fails with
    /// `IdExhausted` once the id space is used up.
    pub fn create_event(
        &mut self,
        name: impl Into<String>,
        date: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Result<EventId> {
        let mut ids = self.ids.clone();
        let id = ids.allocate()?;
        let event = Event::new(id, name, date, start_time, end_time);
        self.check_fields(&event)?;

        let conflicting = self.conflicting_ids(&event, None);
        if !conflicting.is_empty() {
            warn!(name = %event.name, key = %event.key(), ?conflicting, "event rejected: time conflict");
            return Err(ScheduleError::ConflictDetected {
                candidate: event.name,
                conflicting,
            });
        }

        let key = event.key();
        match self.index.insert(event.clone()) {
            InsertOutcome::Inserted => {}
            outcome => return Err(Self::insert_error(outcome, &event)),
        }

        self.ids = ids;
        self.graph.add_vertex(id);
        info!(id, name = %event.name, %key, "event created");
        Ok(id)
    }

    /// Whether `candidate` overlaps any stored event on the same date.
    pub fn detect_conflicts(&self, candidate: &Event) -> bool {
        self.index.detect_conflict(candidate)
    }

    /// Deletes an event from the index and the graph.
    ///
    /// Every event that depended on it loses that dependency.
    pub fn delete_event(&mut self, id: EventId) -> Result<Event> {
        let event = self.index.remove(id).ok_or(ScheduleError::NotFound(id))?;

        let dependents = self.graph.dependents_of(id);
        self.graph.remove_vertex(id);
        for dependent in &dependents {
            if let Some(other) = self.index.get_mut(*dependent) {
                other.dependencies.remove(&id);
            }
        }

        info!(id, name = %event.name, dependents = dependents.len(), "event deleted");
        Ok(event)
    }

    /// Applies field changes to an event.
    ///
    /// A rename is applied in place. A change of date, start or end is
    /// validated and conflict-checked (ignoring the event itself), then the
    /// event is removed and re-inserted so the index stays ordered. On any
    /// error the event is left unchanged.
    ///
    /// Returns `Ok(false)` without doing anything when `id` is unknown.
    pub fn update_event(&mut self, id: EventId, update: EventUpdate) -> Result<bool> {
        let Some(current) = self.index.get(id) else {
            debug!(id, "update ignored: unknown event");
            return Ok(false);
        };

        let mut updated = current.clone();
        update.apply(&mut updated);
        self.check_fields(&updated)?;

        if updated.key() == current.key() {
            if let Some(stored) = self.index.get_mut(id) {
                stored.name = updated.name;
            }
            info!(id, "event renamed");
            return Ok(true);
        }

        let conflicting = self.conflicting_ids(&updated, Some(id));
        if !conflicting.is_empty() {
            warn!(id, key = %updated.key(), ?conflicting, "update rejected: time conflict");
            return Err(ScheduleError::ConflictDetected {
                candidate: updated.name,
                conflicting,
            });
        }

        let Some(original) = self.index.remove(id) else {
            return Ok(false);
        };
        match self.index.insert(updated.clone()) {
            InsertOutcome::Inserted => {
                info!(id, key = %updated.key(), "event rescheduled");
                Ok(true)
            }
            outcome => {
                let restored = self.index.insert(original);
                debug_assert_eq!(restored, InsertOutcome::Inserted);
                warn!(id, key = %updated.key(), ?outcome, "update rejected: slot taken");
                Err(Self::insert_error(outcome, &updated))
            }
        }
    }

    /// Records that `from` depends on `to`.
    ///
    /// Rejected edges leave the graph exactly as it was.
    pub fn add_dependency(&mut self, from: EventId, to: EventId) -> Result<()> {
        match self.graph.add_edge(from, to) {
            EdgeOutcome::Added => {
                if let Some(event) = self.index.get_mut(from) {
                    event.dependencies.insert(to);
                }
                info!(from, to, "dependency recorded");
                Ok(())
            }
            EdgeOutcome::AlreadyPresent => Ok(()),
            EdgeOutcome::CycleRejected => Err(ScheduleError::CycleRejected { from, to }),
            EdgeOutcome::UnknownVertex(id) => Err(ScheduleError::UnknownVertex(id)),
        }
    }

    /// Drops the dependency of `from` on `to`. Returns whether it existed.
    pub fn remove_dependency(&mut self, from: EventId, to: EventId) -> Result<bool> {
        for id in [from, to] {
            if !self.graph.contains(id) {
                return Err(ScheduleError::UnknownVertex(id));
            }
        }
        let removed = self.graph.remove_edge(from, to);
        if removed {
            if let Some(event) = self.index.get_mut(from) {
                event.dependencies.remove(&to);
            }
            info!(from, to, "dependency removed");
        }
        Ok(removed)
    }

    /// Event ids ordered so that every dependency precedes its dependents.
    pub fn topological_order(&self) -> Result<Vec<EventId>> {
        self.graph
            .topological_sort()
            .map_err(|_| ScheduleError::CycleDetected)
    }

    /// Events in dependency order.
    pub fn ordered_events(&self) -> Result<Vec<&Event>> {
        Ok(self
            .topological_order()?
            .into_iter()
            .filter_map(|id| self.index.get(id))
            .collect())
    }

    /// Writes every event as a record line, in chronological order.
    pub fn save<W: Write>(&self, writer: &mut W) -> Result<usize> {
        let count = record::write_records(writer, self.index.iter())?;
        info!(count, "events saved");
        Ok(count)
    }

    /// Reads a record file and rebuilds the calendar.
    pub fn load<R: BufRead>(config: SchedulerConfig, reader: R) -> Result<Self> {
        let events = record::read_records(reader)?;
        Self::from_events(config, events)
    }

    /// Rebuilds a calendar from event records.
    ///
    /// The whole set is validated first; on success graph vertices follow
    /// the record order and the next id is one past the largest id seen.
    /// A record id of `EventId::MAX` leaves no next id and fails the load
    /// with `IdExhausted`.
    pub fn from_events(config: SchedulerConfig, events: Vec<Event>) -> Result<Self> {
        validation::validate_records(&events, config.validate_formats)
            .map_err(ScheduleError::Validation)?;
        if config.enforce_time_order {
            for event in &events {
                validation::validate_time_range(&event.start_time, &event.end_time)?;
            }
        }

        let mut scheduler = Self::with_config(config);
        for event in &events {
            scheduler.ids.observe(event.id)?;
            scheduler.graph.add_vertex(event.id);
        }
        // Records were validated as acyclic, so edges skip the per-edge check.
        for event in &events {
            for &dep in &event.dependencies {
                scheduler.graph.insert_edge_unchecked(event.id, dep);
            }
        }
        for event in events {
            match scheduler.index.insert(event.clone()) {
                InsertOutcome::Inserted => {}
                outcome => return Err(Self::insert_error(outcome, &event)),
            }
        }

        info!(count = scheduler.len(), next_id = scheduler.next_id(), "events loaded");
        Ok(scheduler)
    }

    /// Graphviz text of the dependency graph.
    pub fn dependency_dot(&self) -> String {
        export::dependency_dot(self)
    }

    /// Graphviz text of the index tree.
    pub fn index_dot(&self) -> String {
        export::index_dot(&self.index)
    }
}
