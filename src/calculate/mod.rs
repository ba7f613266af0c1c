//! Statistics calculation engine.
//!
//! Computes derived figures from stored entries or straight from a CSV load:
//! - Billed/unbilled minutes per team member
//! - Monthly minutes for the Fibu project family
//! - Fee, hourly wage and deviation per month
//! - Summary statistics over an entry set
//!
//! Stored entries and CSV rows both implement [`StatRecord`], so every
//! aggregation is written once.

pub mod fibu;
pub mod monthly;
pub mod summary;
pub mod team;

pub use fibu::*;
pub use monthly::*;
pub use summary::*;
pub use team::*;

use chrono::{Datelike, NaiveDate};

use crate::codec::{parse_date, parse_duration_to_minutes};
use crate::models::TimeEntry;
use crate::table::{
    clean_cell, fibu_columns, find_duration_column, is_billed_value, table_columns,
};

/// The view of a record the aggregations need.
pub trait StatRecord {
    /// Trimmed team member name, empty when unknown.
    fn team_member(&self) -> &str;
    fn project(&self) -> &str;
    /// Auftrag code.
    fn assignment(&self) -> &str;
    fn duration_minutes(&self) -> u64;
    fn is_billed(&self) -> bool;
    fn start_date(&self) -> Option<NaiveDate>;

    /// Calendar month (1-12) of the start date.
    fn start_month(&self) -> Option<u32> {
        self.start_date().map(|d| d.month())
    }

    /// Whether the record passes an active team member filter.
    fn matches_team(&self, team: &str) -> bool {
        self.team_member() == team
    }

    /// Whether the record passes an active project filter.
    fn matches_project(&self, project: &str) -> bool {
        self.project().trim() == project
    }
}

impl StatRecord for TimeEntry {
    fn team_member(&self) -> &str {
        self.team_member.trim()
    }

    fn project(&self) -> &str {
        &self.project
    }

    fn assignment(&self) -> &str {
        &self.assignment
    }

    fn duration_minutes(&self) -> u64 {
        TimeEntry::duration_minutes(self)
    }

    fn is_billed(&self) -> bool {
        self.billed
    }

    fn start_date(&self) -> Option<NaiveDate> {
        Some(self.start_date)
    }
}

/// Column positions for reading [`CsvRecord`]s out of a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordColumns {
    pub team: Option<usize>,
    pub project: Option<usize>,
    pub assignment: Option<usize>,
    pub start_date: Option<usize>,
    pub duration: usize,
    pub billed: Option<usize>,
}

impl RecordColumns {
    /// Columns as the team statistics read them. `None` without a duration
    /// column.
    pub fn for_team_stats(headers: &[String]) -> Option<Self> {
        Some(Self {
            team: table_columns::TEAM.resolve(headers),
            project: table_columns::PROJECT.resolve(headers),
            assignment: None,
            start_date: None,
            duration: find_duration_column(headers)?,
            billed: table_columns::BILLED.resolve(headers),
        })
    }

    /// Columns as the monthly Fibu report reads them. `None` without a
    /// duration column.
    pub fn for_fibu(headers: &[String]) -> Option<Self> {
        Some(Self {
            team: fibu_columns::TEAM.resolve(headers),
            project: fibu_columns::PROJECT.resolve(headers),
            assignment: fibu_columns::ASSIGNMENT.resolve(headers),
            start_date: fibu_columns::START_DATE.resolve(headers),
            duration: find_duration_column(headers)?,
            billed: None,
        })
    }
}

/// One CSV row with its cells already cleaned and parsed.
///
/// Filters are looser than for stored entries: without a team column the
/// team filter passes every row, and a blank project cell passes the
/// project filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvRecord {
    /// `None` when the table has no team column
    pub team_member: Option<String>,
    pub project: String,
    pub assignment: String,
    pub minutes: u64,
    pub billed: bool,
    pub start_date: Option<NaiveDate>,
}

impl CsvRecord {
    pub fn from_row(row: &[String], columns: &RecordColumns) -> Self {
        let text = |index: Option<usize>| clean_cell(row, index).unwrap_or_default();
        Self {
            team_member: columns.team.map(|_| text(columns.team)),
            project: text(columns.project),
            assignment: text(columns.assignment),
            minutes: clean_cell(row, Some(columns.duration))
                .map(|d| parse_duration_to_minutes(&d))
                .unwrap_or(0),
            billed: clean_cell(row, columns.billed)
                .map(|b| is_billed_value(&b))
                .unwrap_or(false),
            start_date: clean_cell(row, columns.start_date).and_then(|d| parse_date(&d)),
        }
    }

    pub fn read_all(rows: &[Vec<String>], columns: &RecordColumns) -> Vec<Self> {
        rows.iter().map(|row| Self::from_row(row, columns)).collect()
    }
}

impl StatRecord for CsvRecord {
    fn team_member(&self) -> &str {
        self.team_member.as_deref().unwrap_or_default()
    }

    fn project(&self) -> &str {
        &self.project
    }

    fn assignment(&self) -> &str {
        &self.assignment
    }

    fn duration_minutes(&self) -> u64 {
        self.minutes
    }

    fn is_billed(&self) -> bool {
        self.billed
    }

    fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    fn matches_team(&self, team: &str) -> bool {
        self.team_member.as_deref().map_or(true, |member| member == team)
    }

    fn matches_project(&self, project: &str) -> bool {
        self.project.is_empty() || self.project == project
    }
}

/// Trimmed filter value, `None` when unset or blank.
pub(crate) fn active_filter(filter: Option<&str>) -> Option<&str> {
    filter.map(str::trim).filter(|f| !f.is_empty())
}
