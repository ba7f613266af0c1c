//! Display table built from a CSV load.
//!
//! Mirrors what the data view shows: start/end dates folded into one
//! column, durations as `HH:MM`, billed flags as labels. Rows can be
//! filtered by team member, project and a free-text search, and sorted by
//! any visible column.

use std::cmp::Ordering;

use serde::Serialize;

use super::columns::{find_duration_column, is_billed_value, strip_quotes, table_columns};
use super::csv::{CsvTable, DateColumns, COMBINED_DATE_HEADER};
use crate::codec::format_duration_to_hhmm;

pub const BILLED_LABEL: &str = "Abgerechnet";
pub const UNBILLED_LABEL: &str = "Nicht Abgerechnet";

/// One visible row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayRow {
    pub cells: Vec<String>,
    /// Position of the row in the source CSV
    pub source_index: usize,
}

/// Active row filters. Empty strings count as "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableFilter {
    pub team_member: Option<String>,
    pub project: Option<String>,
    pub search: Option<String>,
}

impl TableFilter {
    fn active(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DisplayTable {
    pub headers: Vec<String>,
    pub rows: Vec<DisplayRow>,
}

impl DisplayTable {
    pub fn build(table: &CsvTable) -> Self {
        let dates = DateColumns::detect(&table.headers);
        let duration_col = find_duration_column(&table.headers);
        let billed_col = table_columns::BILLED.resolve(&table.headers);

        let mut headers: Vec<String> = table
            .headers
            .iter()
            .enumerate()
            .filter(|(i, h)| !dates.hides(*i) && h.as_str() != COMBINED_DATE_HEADER)
            .map(|(_, h)| h.clone())
            .collect();
        if dates.combine {
            headers.push(COMBINED_DATE_HEADER.to_string());
        }

        let rows = table
            .rows
            .iter()
            .enumerate()
            .map(|(source_index, row)| {
                let mut cells: Vec<String> = row
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| !dates.hides(*i))
                    .map(|(i, cell)| {
                        let text = strip_quotes(cell);
                        if Some(i) == billed_col {
                            billed_label(&text).to_string()
                        } else if Some(i) == duration_col {
                            format_duration_to_hhmm(&text)
                        } else {
                            text
                        }
                    })
                    .collect();

                if dates.combine {
                    let combined = dates
                        .start
                        .and_then(|i| row.get(i))
                        .map(|c| strip_quotes(c))
                        .unwrap_or_default();
                    cells.push(combined);
                }

                DisplayRow {
                    cells,
                    source_index,
                }
            })
            .collect();

        Self { headers, rows }
    }

    /// Rows matching every active filter.
    pub fn filtered(&self, filter: &TableFilter) -> Self {
        let team_col = table_columns::TEAM.resolve(&self.headers);
        let project_col = table_columns::PROJECT.resolve(&self.headers);
        let team = TableFilter::active(&filter.team_member);
        let project = TableFilter::active(&filter.project);
        let search = TableFilter::active(&filter.search).map(str::to_lowercase);

        let rows = self
            .rows
            .iter()
            .filter(|row| cell_matches(row, team_col, team))
            .filter(|row| cell_matches(row, project_col, project))
            .filter(|row| match &search {
                Some(query) => row
                    .cells
                    .iter()
                    .any(|c| c.to_lowercase().contains(query.as_str())),
                None => true,
            })
            .cloned()
            .collect();

        Self {
            headers: self.headers.clone(),
            rows,
        }
    }

    /// Sort by a visible column. Numeric when both cells read as numbers,
    /// text otherwise. Stable for equal cells.
    pub fn sort_by(&mut self, column: usize, ascending: bool) {
        self.rows.sort_by(|a, b| {
            let left = a.cells.get(column).map(String::as_str).unwrap_or("");
            let right = b.cells.get(column).map(String::as_str).unwrap_or("");
            let ord = compare_cells(left, right);
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        });
    }

    pub fn column_index(&self, header: &str) -> Option<usize> {
        super::columns::find_column_index(&self.headers, header)
    }
}

fn billed_label(text: &str) -> &'static str {
    if is_billed_value(text) {
        BILLED_LABEL
    } else {
        UNBILLED_LABEL
    }
}

fn cell_matches(row: &DisplayRow, column: Option<usize>, wanted: Option<&str>) -> bool {
    match (column, wanted) {
        (Some(col), Some(wanted)) => match row.cells.get(col) {
            Some(cell) => cell.trim() == wanted,
            None => true,
        },
        _ => true,
    }
}

/// Number parsing as the data view does it: blank reads as 0.
fn cell_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Some(0.0);
    }
    text.parse::<f64>().ok().filter(|n| !n.is_nan())
}

fn compare_cells(a: &str, b: &str) -> Ordering {
    match (cell_number(a), cell_number(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)),
    }
}
