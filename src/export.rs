//! Graphviz DOT export.
//!
//! Produces DOT text only; rendering it to an image is left to the caller.

use crate::index::EventIndex;
use crate::models::Event;
use crate::scheduler::EventScheduler;

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn label(event: &Event) -> String {
    format!(
        "{}\\n{}\\n{}-{}",
        escape(&event.name),
        escape(&event.date),
        escape(&event.start_time),
        escape(&event.end_time)
    )
}

/// Dependency graph as DOT: one node per event, `from -> to` per dependency.
pub fn dependency_dot(scheduler: &EventScheduler) -> String {
    let mut out = String::from("digraph EventGraph {\n");
    out.push_str("  node [fontname=\"Arial\"];\n");

    let graph = scheduler.graph();
    for &id in graph.vertices() {
        if let Some(event) = scheduler.get(id) {
            out.push_str(&format!("  {id} [label=\"{}\"];\n", label(event)));
        }
    }
    for (from, to) in graph.edges() {
        out.push_str(&format!("  {from} -> {to};\n"));
    }
    out.push_str("}\n");
    out
}

/// Index tree as DOT: parent -> child edges, left child first.
pub fn index_dot(index: &EventIndex) -> String {
    let mut out = String::from("digraph AVLTree {\n");
    for event in index.iter() {
        out.push_str(&format!("  {} [label=\"{}\"];\n", event.id, label(event)));
    }
    for (parent, child) in index.tree_edges() {
        out.push_str(&format!("  {} -> {};\n", parent.id, child.id));
    }
    out.push_str("}\n");
    out
}
