//! Ordered event index.
//!
//! Owns every stored [`Event`]. Events are kept in an AVL tree keyed by
//! `(date, start, end)` so insertion and removal stay O(log n) and an
//! in-order walk yields the schedule in chronological order.
//!
//! An `id -> key` map lets callers remove or look up events by id.
//!
//! # Conflict Detection
//! [`EventIndex::detect_conflict`] visits every stored event. The ordering
//! key is not used to prune the scan.

mod tree;

use std::collections::HashMap;

use tracing::debug;

use crate::models::{Event, EventId, EventKey};
use tree::{AvlTree, Link};

/// Result of [`EventIndex::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The event was stored.
    Inserted,
    /// An event with the same `(date, start, end)` already exists. No-op.
    DuplicateKey,
    /// An event with the same id already exists under another key. No-op.
    DuplicateId,
}

/// Self-balancing ordered index over events.
#[derive(Debug, Clone, Default)]
pub struct EventIndex {
    tree: AvlTree,
    keys: HashMap<EventId, EventKey>,
}

impl EventIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored events.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the index holds no events.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Height of the tree (0 when empty).
    pub fn height(&self) -> u32 {
        self.tree.height(self.tree.root)
    }

    /// Whether an event with this id is stored.
    pub fn contains(&self, id: EventId) -> bool {
        self.keys.contains_key(&id)
    }

    /// Looks up an event by id.
    pub fn get(&self, id: EventId) -> Option<&Event> {
        let slot = self.tree.find(self.keys.get(&id)?)?;
        Some(&self.tree.node(slot).event)
    }

    /// Mutable access for non-key fields (name, dependencies).
    ///
    /// Callers must not change `date`, `start_time` or `end_time` through
    /// this reference; key changes go through remove + insert.
    pub(crate) fn get_mut(&mut self, id: EventId) -> Option<&mut Event> {
        let slot = self.tree.find(self.keys.get(&id)?)?;
        Some(self.tree.event_mut(slot))
    }

    /// Looks up an event by its ordering key.
    pub fn get_by_key(&self, key: &EventKey) -> Option<&Event> {
        self.tree.find(key).map(|slot| &self.tree.node(slot).event)
    }

    /// Inserts an event, rebalancing on the way back up.
    pub fn insert(&mut self, event: Event) -> InsertOutcome {
        if self.keys.contains_key(&event.id) {
            debug!(id = event.id, "index insert skipped: id already stored");
            return InsertOutcome::DuplicateId;
        }

        let id = event.id;
        let key = event.key();
        if !self.tree.insert(event) {
            debug!(id, %key, "index insert skipped: key already stored");
            return InsertOutcome::DuplicateKey;
        }

        debug!(id, %key, height = self.height(), "event indexed");
        self.keys.insert(id, key);
        InsertOutcome::Inserted
    }

    /// Removes an event by id. Returns `None` if the id is unknown.
    pub fn remove(&mut self, id: EventId) -> Option<Event> {
        let key = self.keys.get(&id)?.clone();
        self.remove_key(&key)
    }

    /// Removes the event stored under `key`. Returns `None` if absent.
    pub fn remove_key(&mut self, key: &EventKey) -> Option<Event> {
        let event = self.tree.remove(key)?;
        self.keys.remove(&event.id);
        debug!(id = event.id, %key, height = self.height(), "event removed from index");
        Some(event)
    }

    /// Removes every event.
    pub fn clear(&mut self) {
        self.tree.clear();
        self.keys.clear();
    }

    /// In-order traversal: events in ascending `(date, start, end)` order.
    pub fn iter(&self) -> Iter<'_> {
        let mut iter = Iter {
            tree: &self.tree,
            stack: Vec::new(),
        };
        iter.push_left(self.tree.root);
        iter
    }

    /// Stored events whose interval overlaps `candidate` on the same date.
    ///
    /// Visits every stored event.
    pub fn conflicts<'a>(&'a self, candidate: &'a Event) -> impl Iterator<Item = &'a Event> + 'a {
        self.iter().filter(move |other| candidate.overlaps(other))
    }

    /// Whether any stored event conflicts with `candidate`.
    ///
    /// Touching endpoints (`a.end == b.start`) are not a conflict, and
    /// events on different dates never conflict.
    pub fn detect_conflict(&self, candidate: &Event) -> bool {
        self.conflicts(candidate).next().is_some()
    }

    /// Like [`detect_conflict`](Self::detect_conflict) but ignores the
    /// stored event with id `skip` (the event being rescheduled).
    pub fn detect_conflict_excluding(&self, candidate: &Event, skip: EventId) -> bool {
        self.conflicts(candidate).any(|other| other.id != skip)
    }

    /// Event at the root of the tree.
    pub fn root_event(&self) -> Option<&Event> {
        self.tree.root.map(|slot| &self.tree.node(slot).event)
    }

    /// Parent-to-child pairs in pre-order (left child before right child).
    pub fn tree_edges(&self) -> Vec<(&Event, &Event)> {
        let mut edges = Vec::new();
        let mut stack: Vec<usize> = self.tree.root.into_iter().collect();
        while let Some(slot) = stack.pop() {
            let node = self.tree.node(slot);
            for child in [node.left, node.right].into_iter().flatten() {
                edges.push((&node.event, &self.tree.node(child).event));
            }
            // Right pushed first so the left subtree is walked first.
            stack.extend(node.right);
            stack.extend(node.left);
        }
        edges
    }

    /// Checks the balance and ordering invariants of every node.
    pub fn is_balanced(&self) -> bool {
        self.tree.check()
    }
}

impl<'a> IntoIterator for &'a EventIndex {
    type Item = &'a Event;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// In-order iterator over an [`EventIndex`].
pub struct Iter<'a> {
    tree: &'a AvlTree,
    stack: Vec<usize>,
}

impl Iter<'_> {
    fn push_left(&mut self, mut link: Link) {
        while let Some(slot) = link {
            self.stack.push(slot);
            link = self.tree.node(slot).left;
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Event;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.stack.pop()?;
        let tree = self.tree;
        let node = tree.node(slot);
        self.push_left(node.right);
        Some(&node.event)
    }
}
