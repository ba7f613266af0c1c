//! Monthly minutes for one project family.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{active_filter, CsvRecord, RecordColumns, StatRecord};
use crate::codec::extract_month_from_auftrag;
use crate::models::MonthlyTotals;
use crate::table::CsvTable;

/// Spellings of one project, matched as case-insensitive substrings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFamily {
    variants: Vec<String>,
}

impl ProjectFamily {
    pub fn new<I, S>(variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            variants: variants
                .into_iter()
                .map(|v| v.as_ref().trim().to_lowercase())
                .filter(|v| !v.is_empty())
                .collect(),
        }
    }

    /// Financial accounting ("Finanzbuchführung") and its short forms.
    pub fn fibu() -> Self {
        Self::new(["finanzbuchführung", "finanzbuchfuehrung", "fibu"])
    }

    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    pub fn matches(&self, project: &str) -> bool {
        let project = project.to_lowercase();
        self.variants.iter().any(|v| project.contains(v.as_str()))
    }
}

impl Default for ProjectFamily {
    fn default() -> Self {
        Self::fibu()
    }
}

/// Month (1-12) a record is booked on: the Auftrag code wins over the start
/// date.
pub fn booking_month<R: StatRecord>(record: &R) -> Option<u32> {
    extract_month_from_auftrag(record.assignment()).or_else(|| record.start_month())
}

/// Sum minutes per month over records of the project family, optionally
/// limited to one team member. Records without a determinable month are
/// dropped.
pub fn compute_monthly_project_totals<R: StatRecord>(
    records: &[R],
    family: &ProjectFamily,
    team_filter: Option<&str>,
) -> MonthlyTotals {
    let team_filter = active_filter(team_filter);
    let mut totals = MonthlyTotals::default();
    let mut dropped = 0usize;

    for record in records {
        if let Some(team) = team_filter {
            if !record.matches_team(team) {
                continue;
            }
        }
        if !family.matches(record.project()) {
            continue;
        }

        let minutes = record.duration_minutes();
        if minutes == 0 {
            continue;
        }

        match booking_month(record) {
            Some(month) => totals.add(month as usize - 1, minutes),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!("{} records without a booking month were dropped", dropped);
    }
    totals
}

/// Monthly totals straight from a CSV load. `None` when the table has no
/// duration column.
pub fn monthly_totals_from_table(
    table: &CsvTable,
    family: &ProjectFamily,
    team_filter: Option<&str>,
) -> Option<MonthlyTotals> {
    let columns = RecordColumns::for_fibu(&table.headers)?;
    let records = CsvRecord::read_all(&table.rows, &columns);
    Some(compute_monthly_project_totals(&records, family, team_filter))
}
