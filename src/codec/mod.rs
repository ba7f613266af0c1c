//! Free-form text codecs.
//!
//! Exported time sheets spell durations, dates and order codes in several
//! ways. Each heuristic lives behind a named function that returns an
//! `Option` (or a safe default) instead of failing:
//! - **duration**: "2h 15m 30s", "01:30", "01:30:00"
//! - **date**: "05.03.2024", "5/3/2024", ISO
//! - **month**: month numbers embedded in Auftrag codes ("04.2025", "IV")

pub mod date;
pub mod duration;
pub mod month;

pub use date::*;
pub use duration::*;
pub use month::*;
