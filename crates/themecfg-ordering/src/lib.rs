//! Group ordering for theme configuration fragments.
//!
//! Custom config fragments are flat sequences of JSON objects, each tagged with
//! a `group`. This crate validates those records and reorders them so that the
//! groups named in an ordering specification follow one another.

mod engine;
mod error;
mod record;
mod spec;

pub use engine::{locate, reorder, GroupSpan, ReorderOutcome};
pub use error::{MalformedReason, OrderingError, OrderingResult};
pub use record::{Record, GROUP_KEY};
pub use spec::OrderingSpec;
