//! # Zeiterfassung
//!
//! Time-tracking ingestion and billing statistics over exported CSV time
//! sheets.
//!
//! ## Architecture
//!
//! - **codec**: Duration, date and Auftrag month heuristics
//! - **table**: CSV splitting, column discovery and the display table
//! - **models**: Time entries, ids and derived statistics
//! - **ingest**: CSV rows to entries, merge policies
//! - **storage**: Key/value backends and the persisted entry collection
//! - **calculate**: Team, monthly, Fibu and summary statistics
//! - **tracker**: Manual entries
//! - **config**: Configuration loading and validation

pub mod calculate;
pub mod codec;
pub mod config;
pub mod ingest;
pub mod models;
pub mod storage;
pub mod table;
pub mod tracker;

pub use models::*;
