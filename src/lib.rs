//! Personal event calendar core.
//!
//! Keeps events in a self-balancing ordered index, rejects overlapping
//! time slots, and tracks "depends-on" relations between events in a
//! graph that never contains a cycle.
//!
//! # Modules
//!
//! - **`models`**: `Event`, `EventKey`, `EventId`
//! - **`index`**: AVL-tree index ordered by `(date, start, end)` with conflict scanning
//! - **`graph`**: Dependency graph with cycle rejection and topological sorting
//! - **`scheduler`**: `EventScheduler` facade, `SchedulerConfig`, `IdGenerator`
//! - **`record`**: Line-oriented persistence format
//! - **`validation`**: Field formats and record-set integrity checks
//! - **`export`**: Graphviz DOT output
//! - **`error`**: `ScheduleError`
//!
//! # Time Model
//!
//! Dates (`YYYY-MM-DD`) and times (`HH:MM`) are compared as strings.
//! There is no timezone handling and no recurring events.
//!
//! # References
//!
//! - Adelson-Velsky & Landis (1962), "An algorithm for the organization of information"
//! - Cormen et al. (2009), "Introduction to Algorithms", Ch. 22

pub mod error;
pub mod export;
pub mod graph;
pub mod index;
pub mod models;
pub mod record;
pub mod scheduler;
pub mod validation;

pub use error::{Result, ScheduleError};
pub use models::{Event, EventId, EventKey};
pub use scheduler::{EventScheduler, EventUpdate, SchedulerConfig};
