//! Event dependency graph.
//!
//! Vertices are event ids; an edge `from -> to` means "`from` depends on
//! `to`". Edges are stored in the source vertex's adjacency list. The graph
//! never holds a directed cycle after a successful mutation: [`add_edge`]
//! rolls back any edge that would close one.
//!
//! Both cycle detection and topological sorting walk vertices in creation
//! order with an explicit work stack, so results are reproducible and deep
//! chains cannot overflow the call stack.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.3-22.4
//!
//! [`add_edge`]: DependencyGraph::add_edge

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::models::EventId;

/// Result of [`DependencyGraph::add_edge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOutcome {
    /// The edge was stored.
    Added,
    /// The edge already existed. No-op.
    AlreadyPresent,
    /// The edge would create a cycle and was rolled back.
    CycleRejected,
    /// One of the endpoints is not a vertex.
    UnknownVertex(EventId),
}

/// Returned by [`DependencyGraph::topological_sort`] when a back edge is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleDetected;

/// DFS colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// Directed dependency graph over event ids.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Vertices in creation order.
    order: Vec<EventId>,
    /// Outgoing edges per vertex ("depends on").
    adjacency: HashMap<EventId, Vec<EventId>>,
}

impl DependencyGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a vertex. Adding an existing vertex is a no-op.
    pub fn add_vertex(&mut self, id: EventId) {
        if self.adjacency.contains_key(&id) {
            return;
        }
        self.adjacency.insert(id, Vec::new());
        self.order.push(id);
    }

    /// Removes a vertex with all its outgoing and incoming edges.
    ///
    /// Returns `false` if the vertex did not exist.
    pub fn remove_vertex(&mut self, id: EventId) -> bool {
        if self.adjacency.remove(&id).is_none() {
            return false;
        }
        self.order.retain(|&v| v != id);
        for targets in self.adjacency.values_mut() {
            targets.retain(|&t| t != id);
        }
        true
    }

    /// Whether `id` is a vertex.
    pub fn contains(&self, id: EventId) -> bool {
        self.adjacency.contains_key(&id)
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.order.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    /// Vertices in creation order.
    pub fn vertices(&self) -> &[EventId] {
        &self.order
    }

    /// Events that `id` depends on, in insertion order.
    pub fn dependencies_of(&self, id: EventId) -> &[EventId] {
        self.adjacency.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Events that depend on `id`, in creation order.
    pub fn dependents_of(&self, id: EventId) -> Vec<EventId> {
        self.order
            .iter()
            .copied()
            .filter(|v| self.dependencies_of(*v).contains(&id))
            .collect()
    }

    /// All edges `(from, to)`, sources in creation order.
    pub fn edges(&self) -> Vec<(EventId, EventId)> {
        self.order
            .iter()
            .flat_map(|&from| self.dependencies_of(from).iter().map(move |&to| (from, to)))
            .collect()
    }

    /// Adds the edge `from -> to` ("`from` depends on `to`").
    ///
    /// The edge is appended tentatively and the whole graph is checked for
    /// cycles. If one is found the edge is removed again, leaving the
    /// adjacency lists exactly as they were before the call.
    pub fn add_edge(&mut self, from: EventId, to: EventId) -> EdgeOutcome {
        if !self.contains(from) {
            return EdgeOutcome::UnknownVertex(from);
        }
        if !self.contains(to) {
            return EdgeOutcome::UnknownVertex(to);
        }
        if self.dependencies_of(from).contains(&to) {
            return EdgeOutcome::AlreadyPresent;
        }

        if let Some(targets) = self.adjacency.get_mut(&from) {
            targets.push(to);
        }

        if self.has_cycle() {
            // Rollback: the tentative edge is always the last entry.
            if let Some(targets) = self.adjacency.get_mut(&from) {
                targets.pop();
            }
            warn!(from, to, "dependency rejected: would create a cycle");
            return EdgeOutcome::CycleRejected;
        }

        debug!(from, to, "dependency added");
        EdgeOutcome::Added
    }

    /// Appends `from -> to` without the cycle check.
    ///
    /// Used to mirror declared dependencies before validating them as a
    /// whole. Unknown endpoints and existing edges are ignored.
    pub(crate) fn insert_edge_unchecked(&mut self, from: EventId, to: EventId) {
        if !self.contains(to) {
            return;
        }
        if let Some(targets) = self.adjacency.get_mut(&from) {
            if !targets.contains(&to) {
                targets.push(to);
            }
        }
    }

    /// Removes the edge `from -> to`. Returns `false` if it did not exist.
    pub fn remove_edge(&mut self, from: EventId, to: EventId) -> bool {
        let Some(targets) = self.adjacency.get_mut(&from) else {
            return false;
        };
        let before = targets.len();
        targets.retain(|&t| t != to);
        targets.len() != before
    }

    /// Whether the graph contains a directed cycle.
    pub fn has_cycle(&self) -> bool {
        self.depth_first(|_| {}).is_err()
    }

    /// Linearizes the graph so every dependency precedes its dependents.
    ///
    /// For every edge `(u, v)`, `v` appears before `u` in the result.
    /// Returns [`CycleDetected`] instead of looping if the graph is cyclic.
    pub fn topological_sort(&self) -> Result<Vec<EventId>, CycleDetected> {
        let mut finished = Vec::with_capacity(self.order.len());
        self.depth_first(|id| finished.push(id))?;
        Ok(finished)
    }

    /// Iterative DFS over all vertices in creation order.
    ///
    /// Calls `on_finish` with each vertex in post-order. A dependency
    /// always finishes before the vertex that depends on it. Stops with
    /// [`CycleDetected`] on the first edge into a vertex still on the stack.
    fn depth_first(&self, mut on_finish: impl FnMut(EventId)) -> Result<(), CycleDetected> {
        let mut marks: HashMap<EventId, Mark> =
            self.order.iter().map(|&v| (v, Mark::Unvisited)).collect();
        // (vertex, index of the next outgoing edge to explore)
        let mut stack: Vec<(EventId, usize)> = Vec::new();

        for &root in &self.order {
            if marks.get(&root) != Some(&Mark::Unvisited) {
                continue;
            }
            marks.insert(root, Mark::OnStack);
            stack.push((root, 0));

            while let Some(frame) = stack.last_mut() {
                let (vertex, next) = *frame;
                let targets = self.dependencies_of(vertex);

                if next < targets.len() {
                    frame.1 += 1;
                    let target = targets[next];
                    match marks.get(&target).copied() {
                        Some(Mark::OnStack) => return Err(CycleDetected),
                        Some(Mark::Unvisited) => {
                            marks.insert(target, Mark::OnStack);
                            stack.push((target, 0));
                        }
                        // Finished, or a dangling id that is not a vertex.
                        Some(Mark::Done) | None => {}
                    }
                } else {
                    stack.pop();
                    marks.insert(vertex, Mark::Done);
                    on_finish(vertex);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with(vertices: &[EventId]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for &v in vertices {
            graph.add_vertex(v);
        }
        graph
    }

    fn position(order: &[EventId], id: EventId) -> usize {
        order.iter().position(|&v| v == id).unwrap()
    }

    #[test]
    fn test_add_vertex_idempotent() {
        let mut graph = graph_with(&[1, 2]);
        graph.add_vertex(1);
        assert_eq!(graph.vertices(), &[1, 2]);
        assert_eq!(graph.vertex_count(), 2);
    }

    #[test]
    fn test_add_edge_unknown_vertex() {
        let mut graph = graph_with(&[1]);
        assert_eq!(graph.add_edge(1, 9), EdgeOutcome::UnknownVertex(9));
        assert_eq!(graph.add_edge(9, 1), EdgeOutcome::UnknownVertex(9));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_reverse_edge_rejected() {
        let mut graph = graph_with(&[1, 2]);
        assert_eq!(graph.add_edge(1, 2), EdgeOutcome::Added);
        assert_eq!(graph.add_edge(2, 1), EdgeOutcome::CycleRejected);
        assert_eq!(graph.edges(), vec![(1, 2)]);
    }

    #[test]
    fn test_self_loop_rejected() {
        let mut graph = graph_with(&[1]);
        assert_eq!(graph.add_edge(1, 1), EdgeOutcome::CycleRejected);
        assert!(graph.dependencies_of(1).is_empty());
    }

    #[test]
    fn test_rejection_restores_existing_list() {
        // 1 -> 2 -> 3, 1 -> 4; adding 3 -> 1 must leave every list as it was.
        let mut graph = graph_with(&[1, 2, 3, 4]);
        graph.add_edge(1, 2);
        graph.add_edge(2, 3);
        graph.add_edge(1, 4);
        graph.add_edge(3, 4);
        let before = graph.edges();

        assert_eq!(graph.add_edge(3, 1), EdgeOutcome::CycleRejected);
        assert_eq!(graph.edges(), before);
        assert_eq!(graph.dependencies_of(3), &[4]);
    }

    #[test]
    fn test_duplicate_edge() {
        let mut graph = graph_with(&[1, 2]);
        graph.add_edge(1, 2);
        assert_eq!(graph.add_edge(1, 2), EdgeOutcome::AlreadyPresent);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_topological_chain() {
        let mut graph = graph_with(&[1, 2, 3]);
        graph.add_edge(1, 2);
        graph.add_edge(2, 3);
        assert_eq!(graph.topological_sort().unwrap(), vec![3, 2, 1]);
    }

    #[test]
    fn test_topological_diamond() {
        // 4 depends on 2 and 3, both depend on 1.
        let mut graph = graph_with(&[1, 2, 3, 4]);
        graph.add_edge(4, 2);
        graph.add_edge(4, 3);
        graph.add_edge(2, 1);
        graph.add_edge(3, 1);

        let order = graph.topological_sort().unwrap();
        assert_eq!(order.len(), 4);
        for (u, v) in graph.edges() {
            assert!(position(&order, v) < position(&order, u), "{v} must precede {u}");
        }
    }

    #[test]
    fn test_topological_is_deterministic() {
        let build = || {
            let mut graph = graph_with(&[5, 3, 8, 1]);
            graph.add_edge(8, 3);
            graph.add_edge(5, 1);
            graph
        };
        let first = build().topological_sort().unwrap();
        for _ in 0..10 {
            assert_eq!(build().topological_sort().unwrap(), first);
        }
        assert_eq!(first, vec![1, 5, 3, 8]);
    }

    #[test]
    fn test_topological_defends_against_cycle() {
        let mut graph = graph_with(&[1, 2]);
        // Bypass add_edge to simulate a corrupted graph.
        graph.insert_edge_unchecked(1, 2);
        graph.insert_edge_unchecked(2, 1);

        assert!(graph.has_cycle());
        assert_eq!(graph.topological_sort(), Err(CycleDetected));
    }

    #[test]
    fn test_remove_vertex_drops_incident_edges() {
        let mut graph = graph_with(&[1, 2, 3]);
        graph.add_edge(1, 2);
        graph.add_edge(2, 3);

        assert!(graph.remove_vertex(2));
        assert!(!graph.remove_vertex(2));
        assert!(graph.edges().is_empty());
        assert_eq!(graph.topological_sort().unwrap(), vec![1, 3]);
    }

    #[test]
    fn test_remove_edge() {
        let mut graph = graph_with(&[1, 2]);
        graph.add_edge(1, 2);
        assert!(graph.remove_edge(1, 2));
        assert!(!graph.remove_edge(1, 2));
        assert_eq!(graph.add_edge(2, 1), EdgeOutcome::Added);
    }

    #[test]
    fn test_dependents_of() {
        let mut graph = graph_with(&[1, 2, 3]);
        graph.add_edge(2, 1);
        graph.add_edge(3, 1);
        assert_eq!(graph.dependents_of(1), vec![2, 3]);
        assert!(graph.dependents_of(2).is_empty());
    }

    #[test]
    fn test_long_chain_no_stack_overflow() {
        let n = 50_000;
        let mut graph = DependencyGraph::new();
        for v in 0..n {
            graph.add_vertex(v);
        }
        // 0 -> 1 -> ... -> n-1, so the walk from vertex 0 is n frames deep.
        for v in 1..n {
            graph.insert_edge_unchecked(v - 1, v);
        }
        assert!(!graph.has_cycle());
        let order = graph.topological_sort().unwrap();
        assert_eq!(order.first(), Some(&(n - 1)));
        assert_eq!(order.last(), Some(&0));
    }
}
