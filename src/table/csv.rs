//! Naive CSV splitting.
//!
//! Lines are split on every comma. Quoted fields are not parsed: a comma
//! inside quotes shifts the remaining cells of that row. Literal `"`
//! characters are stripped from headers here and from cells by each reader.

use serde::Serialize;
use tracing::debug;

use super::columns::{find_column_index, strip_quotes};

/// Header appended when separate start/end date columns are shown as one.
pub const COMBINED_DATE_HEADER: &str = "Bearbeitungsdatum";

/// Headers and raw rows of one CSV load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Location of the start/end date columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateColumns {
    pub start: Option<usize>,
    pub end: Option<usize>,
    /// Both columns exist and are displayed as one combined column
    pub combine: bool,
}

impl DateColumns {
    /// Locate "start date" and "end date" headers.
    pub fn detect(headers: &[String]) -> Self {
        let start = find_column_index(headers, "start date");
        let end = find_column_index(headers, "end date");
        Self {
            start,
            end,
            combine: start.is_some() && end.is_some(),
        }
    }

    /// True for a column hidden behind the combined date column.
    pub fn hides(&self, index: usize) -> bool {
        self.combine && (self.start == Some(index) || self.end == Some(index))
    }
}

impl CsvTable {
    /// Split raw CSV text. Blank lines are dropped; the first remaining line
    /// becomes the header row. Empty input gives an empty table.
    pub fn parse(raw: &str) -> Self {
        let mut lines = raw
            .split('\n')
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.split(',').map(str::to_string).collect::<Vec<_>>());

        let headers = match lines.next() {
            Some(headers) => headers.iter().map(|h| strip_quotes(h)).collect::<Vec<_>>(),
            None => return Self::default(),
        };
        let rows: Vec<Vec<String>> = lines.collect();

        debug!("Parsed CSV with {} columns and {} rows", headers.len(), rows.len());
        Self { headers, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Detect start/end date columns and, when both exist, append the
    /// synthetic [`COMBINED_DATE_HEADER`] to the headers.
    pub fn derive_combined_date_column(&mut self) -> DateColumns {
        let columns = DateColumns::detect(&self.headers);
        if columns.combine && !self.headers.iter().any(|h| h == COMBINED_DATE_HEADER) {
            self.headers.push(COMBINED_DATE_HEADER.to_string());
        }
        columns
    }
}
