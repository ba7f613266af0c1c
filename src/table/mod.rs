//! Tabular view of exported CSV time sheets.
//!
//! - **csv**: naive comma split into headers and rows
//! - **columns**: heuristic column discovery with per-call-site fallbacks
//! - **display**: visible columns, filtering, search and sorting

pub mod columns;
pub mod csv;
pub mod display;

pub use columns::*;
pub use csv::*;
pub use display::*;
