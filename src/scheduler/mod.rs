//! Calendar facade and its configuration.
//!
//! `EventScheduler` is the only entry point a presentation or persistence
//! layer needs: it creates, updates and deletes events, records
//! dependencies, linearizes them and reads/writes the record format.
//!
//! # Concurrency
//!
//! Every mutation takes `&mut self`. To share a calendar between threads,
//! wrap the whole `EventScheduler` in a single `Mutex`; the index and the
//! graph have no locking of their own.

mod calendar;
mod config;
mod ids;

pub use calendar::{EventScheduler, EventUpdate};
pub use config::SchedulerConfig;
pub use ids::IdGenerator;
