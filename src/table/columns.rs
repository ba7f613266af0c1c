//! Column discovery.
//!
//! Exports are hand-maintained and mix German and English headers, so
//! columns are found by case-insensitive keyword search. Each caller
//! describes its lookup as a [`ColumnSpec`]; fallbacks differ between the
//! data table, the import, the Fibu report and the entry form and must not
//! be shared.

use std::collections::BTreeSet;

/// Case-insensitive substring search over header names.
pub fn find_column_index(headers: &[String], keyword: &str) -> Option<usize> {
    let keyword = keyword.to_lowercase();
    headers
        .iter()
        .position(|h| h.to_lowercase().contains(&keyword))
}

/// First header mentioning "dauer" or "duration".
pub fn find_duration_column(headers: &[String]) -> Option<usize> {
    headers.iter().position(|h| {
        let h = h.to_lowercase();
        h.contains("dauer") || h.contains("duration")
    })
}

/// A keyword lookup with its call-site fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Tried in order; the first keyword found wins
    pub keywords: &'static [&'static str],
    /// Used when no keyword matches
    pub fallback: Option<usize>,
}

impl ColumnSpec {
    pub const fn new(keywords: &'static [&'static str], fallback: Option<usize>) -> Self {
        Self { keywords, fallback }
    }

    pub fn resolve(&self, headers: &[String]) -> Option<usize> {
        self.keywords
            .iter()
            .find_map(|k| find_column_index(headers, k))
            .or(self.fallback)
    }
}

/// Lookups used by the data table and the team statistics.
pub mod table_columns {
    use super::ColumnSpec;

    pub const TEAM: ColumnSpec = ColumnSpec::new(&["team"], Some(0));
    pub const PROJECT: ColumnSpec = ColumnSpec::new(&["projekt"], Some(2));
    pub const BILLED: ColumnSpec = ColumnSpec::new(&["abgerechnet"], None);
}

/// Lookups used when importing rows into the entry store.
pub mod import_columns {
    use super::ColumnSpec;

    pub const TEAM: ColumnSpec = ColumnSpec::new(&["team", "teammitglied"], None);
    pub const CUSTOMER: ColumnSpec = ColumnSpec::new(&["kunde", "kunden"], None);
    pub const PROJECT: ColumnSpec = ColumnSpec::new(&["projekt", "projekte"], None);
    pub const ASSIGNMENT: ColumnSpec = ColumnSpec::new(&["auftrag"], None);
    pub const NOTES: ColumnSpec = ColumnSpec::new(&["note", "notizen", "notiz"], None);
    pub const START_DATE: ColumnSpec = ColumnSpec::new(&["start", "datum"], None);
    pub const BILLED: ColumnSpec = ColumnSpec::new(&["abgerechnet"], None);
}

/// Lookups used by the monthly Fibu report.
pub mod fibu_columns {
    use super::ColumnSpec;

    pub const TEAM: ColumnSpec = ColumnSpec::new(&["team"], None);
    pub const PROJECT: ColumnSpec = ColumnSpec::new(&["projekt"], None);
    pub const ASSIGNMENT: ColumnSpec = ColumnSpec::new(&["auftrag"], None);
    pub const START_DATE: ColumnSpec = ColumnSpec::new(&["start"], None);
}

/// Lookups used to fill the manual entry form's option lists.
pub mod form_columns {
    use super::ColumnSpec;

    pub const TEAM: ColumnSpec = ColumnSpec::new(&["team"], Some(0));
    pub const CUSTOMER: ColumnSpec = ColumnSpec::new(&["kund"], Some(1));
    pub const PROJECT: ColumnSpec = ColumnSpec::new(&["projekt"], Some(2));
}

pub fn strip_quotes(text: &str) -> String {
    text.replace('"', "")
}

/// Cell text with quotes stripped and whitespace trimmed.
///
/// `None` when the column is unresolved, the row is too short or the raw
/// cell is empty.
pub fn clean_cell(row: &[String], index: Option<usize>) -> Option<String> {
    let raw = row.get(index?)?;
    if raw.is_empty() {
        return None;
    }
    Some(strip_quotes(raw).trim().to_string())
}

/// Distinct non-empty values of a column, sorted ascending.
pub fn extract_unique_values(rows: &[Vec<String>], column: usize) -> Vec<String> {
    rows.iter()
        .filter_map(|row| clean_cell(row, Some(column)))
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Billed vocabulary: "ja", "yes", "true", "1" in any case.
pub fn is_billed_value(text: &str) -> bool {
    matches!(
        text.trim().to_lowercase().as_str(),
        "ja" | "yes" | "true" | "1"
    )
}
