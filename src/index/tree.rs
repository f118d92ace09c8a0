//! Arena-backed AVL tree.
//!
//! Nodes live in a `Vec` and refer to their children by slot index.
//! Rotations reassign indices instead of rewiring pointers. Freed slots
//! are recycled through a free list.
//!
//! Heights: empty subtree = 0, leaf = 1.
//!
//! # Reference
//! Adelson-Velsky & Landis (1962); Weiss (2014), "Data Structures and
//! Algorithm Analysis in C++", Ch. 4.4

use std::cmp::Ordering;

use crate::models::{Event, EventKey};

pub(super) type Link = Option<usize>;

#[derive(Debug, Clone, Default)]
pub(super) struct Node {
    pub(super) event: Event,
    pub(super) left: Link,
    pub(super) right: Link,
    pub(super) height: u32,
}

/// Balanced binary search tree of events ordered by `(date, start, end)`.
#[derive(Debug, Clone, Default)]
pub(super) struct AvlTree {
    nodes: Vec<Node>,
    free: Vec<usize>,
    pub(super) root: Link,
}

impl AvlTree {
    pub(super) fn node(&self, slot: usize) -> &Node {
        &self.nodes[slot]
    }

    pub(super) fn event_mut(&mut self, slot: usize) -> &mut Event {
        &mut self.nodes[slot].event
    }

    #[inline]
    pub(super) fn height(&self, link: Link) -> u32 {
        link.map_or(0, |slot| self.nodes[slot].height)
    }

    fn balance_factor(&self, slot: usize) -> i64 {
        let node = &self.nodes[slot];
        i64::from(self.height(node.left)) - i64::from(self.height(node.right))
    }

    fn update_height(&mut self, slot: usize) {
        let node = &self.nodes[slot];
        let height = 1 + self.height(node.left).max(self.height(node.right));
        self.nodes[slot].height = height;
    }

    fn alloc(&mut self, event: Event) -> usize {
        let node = Node {
            event,
            left: None,
            right: None,
            height: 1,
        };
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, slot: usize) -> Event {
        let node = std::mem::take(&mut self.nodes[slot]);
        self.free.push(slot);
        node.event
    }

    pub(super) fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.root = None;
    }

    /// Finds the slot holding `key`.
    pub(super) fn find(&self, key: &EventKey) -> Link {
        let target = key.as_tuple();
        let mut link = self.root;
        while let Some(slot) = link {
            let node = &self.nodes[slot];
            link = match target.cmp(&node.event.key_ref()) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return Some(slot),
            };
        }
        None
    }

    fn leftmost(&self, mut slot: usize) -> usize {
        while let Some(left) = self.nodes[slot].left {
            slot = left;
        }
        slot
    }

    //  k2            k1
    //  / \          /  \
    // k1  C   =>   A   k2
    // / \              / \
    // A  B            B   C
    fn rotate_right(&mut self, k2: usize) -> usize {
        let Some(k1) = self.nodes[k2].left else {
            return k2;
        };
        self.nodes[k2].left = self.nodes[k1].right;
        self.nodes[k1].right = Some(k2);
        self.update_height(k2);
        self.update_height(k1);
        k1
    }

    fn rotate_left(&mut self, k1: usize) -> usize {
        let Some(k2) = self.nodes[k1].right else {
            return k1;
        };
        self.nodes[k1].right = self.nodes[k2].left;
        self.nodes[k2].left = Some(k1);
        self.update_height(k1);
        self.update_height(k2);
        k2
    }

    /// Restores the balance invariant at `slot` and returns the new subtree root.
    fn rebalance(&mut self, slot: usize) -> usize {
        self.update_height(slot);
        let bf = self.balance_factor(slot);

        if bf > 1 {
            if let Some(left) = self.nodes[slot].left {
                if self.balance_factor(left) < 0 {
                    let new_left = self.rotate_left(left);
                    self.nodes[slot].left = Some(new_left);
                }
                return self.rotate_right(slot);
            }
        } else if bf < -1 {
            if let Some(right) = self.nodes[slot].right {
                if self.balance_factor(right) > 0 {
                    let new_right = self.rotate_right(right);
                    self.nodes[slot].right = Some(new_right);
                }
                return self.rotate_left(slot);
            }
        }
        slot
    }

    /// Inserts `event` and returns whether it was attached.
    ///
    /// An event whose key is already present is dropped and the tree is
    /// left untouched.
    pub(super) fn insert(&mut self, event: Event) -> bool {
        let (root, inserted) = self.insert_at(self.root, event);
        self.root = Some(root);
        inserted
    }

    fn insert_at(&mut self, link: Link, event: Event) -> (usize, bool) {
        let Some(slot) = link else {
            return (self.alloc(event), true);
        };

        let inserted = match event.cmp_key(&self.nodes[slot].event) {
            Ordering::Less => {
                let (child, inserted) = self.insert_at(self.nodes[slot].left, event);
                self.nodes[slot].left = Some(child);
                inserted
            }
            Ordering::Greater => {
                let (child, inserted) = self.insert_at(self.nodes[slot].right, event);
                self.nodes[slot].right = Some(child);
                inserted
            }
            Ordering::Equal => false,
        };

        if inserted {
            (self.rebalance(slot), true)
        } else {
            (slot, false)
        }
    }

    /// Removes the event stored under `key`.
    pub(super) fn remove(&mut self, key: &EventKey) -> Option<Event> {
        let (root, removed) = self.remove_at(self.root, key);
        self.root = root;
        removed
    }

    fn remove_at(&mut self, link: Link, key: &EventKey) -> (Link, Option<Event>) {
        let Some(slot) = link else {
            return (None, None);
        };

        let removed = match key.as_tuple().cmp(&self.nodes[slot].event.key_ref()) {
            Ordering::Less => {
                let (child, removed) = self.remove_at(self.nodes[slot].left, key);
                self.nodes[slot].left = child;
                removed
            }
            Ordering::Greater => {
                let (child, removed) = self.remove_at(self.nodes[slot].right, key);
                self.nodes[slot].right = child;
                removed
            }
            Ordering::Equal => match (self.nodes[slot].left, self.nodes[slot].right) {
                (Some(_), Some(right)) => {
                    // Pull the in-order successor up, then delete its old node.
                    let successor_key = self.nodes[self.leftmost(right)].event.key();
                    let (child, successor) = self.remove_at(Some(right), &successor_key);
                    self.nodes[slot].right = child;
                    successor.map(|event| std::mem::replace(&mut self.nodes[slot].event, event))
                }
                (left, right) => {
                    let event = self.release(slot);
                    return (left.or(right), Some(event));
                }
            },
        };

        match removed {
            Some(event) => (Some(self.rebalance(slot)), Some(event)),
            None => (Some(slot), None),
        }
    }

    /// Verifies cached heights, balance and key order of every node.
    pub(super) fn check(&self) -> bool {
        self.check_at(self.root).is_some()
    }

    fn check_at(&self, link: Link) -> Option<u32> {
        let Some(slot) = link else {
            return Some(0);
        };
        let node = &self.nodes[slot];
        let left = self.check_at(node.left)?;
        let right = self.check_at(node.right)?;

        if left.abs_diff(right) > 1 || node.height != 1 + left.max(right) {
            return None;
        }
        if let Some(l) = node.left {
            if self.nodes[l].event.cmp_key(&node.event) != Ordering::Less {
                return None;
            }
        }
        if let Some(r) = node.right {
            if self.nodes[r].event.cmp_key(&node.event) != Ordering::Greater {
                return None;
            }
        }
        Some(node.height)
    }
}
