//! Core data models.

mod entry;
mod ids;
mod stats;

pub use entry::*;
pub use ids::*;
pub use stats::*;
