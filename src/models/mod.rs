//! Calendar domain models.
//!
//! | Type | Meaning |
//! |------|---------|
//! | `Event` | A named time slot on a date, with dependency ids |
//! | `EventKey` | Ordering key `(date, start, end)` |
//! | `EventId` | Stable identifier assigned by the scheduler |

mod event;

pub use event::{Event, EventId, EventKey};
