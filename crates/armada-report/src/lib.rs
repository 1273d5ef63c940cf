//! Armada report - outcome aggregation and rendering.
//!
//! [`aggregate`] holds the pure functions over outcome batches (counts,
//! filters, duration statistics, the [`Summary`](aggregate::Summary)).
//! [`render`] turns aggregated data into table, JSON, or YAML text; it is
//! the only place presentation concerns live.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod aggregate;
pub mod render;

pub use aggregate::{Summary, summarize};
pub use render::{OutputFormat, Renderer};
