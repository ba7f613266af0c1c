//! Summary statistics over a set of entries.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::TimeEntry;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryStatistics {
    pub total_entries: usize,
    pub total_minutes: u64,
    pub billed_minutes: u64,
    pub unbilled_minutes: u64,
    /// Share of billed minutes, 0-100
    pub billed_percentage: f64,
    pub average_minutes: f64,
    pub min_minutes: u64,
    pub max_minutes: u64,
    pub median_minutes: f64,
    /// Sample standard deviation; needs at least two entries
    pub std_dev_minutes: Option<f64>,
    pub customer_count: usize,
    /// Distinct Auftrag codes
    pub project_count: usize,
    pub team_member_count: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    /// Days from first to last start date, both included
    pub date_range_days: i64,
}

impl SummaryStatistics {
    pub fn total_hours(&self) -> f64 {
        self.total_minutes as f64 / 60.0
    }

    pub fn billed_hours(&self) -> f64 {
        self.billed_minutes as f64 / 60.0
    }

    pub fn unbilled_hours(&self) -> f64 {
        self.unbilled_minutes as f64 / 60.0
    }
}

pub fn compute_summary_statistics(entries: &[TimeEntry]) -> SummaryStatistics {
    if entries.is_empty() {
        return SummaryStatistics::default();
    }

    let mut minutes: Vec<u64> = entries.iter().map(TimeEntry::duration_minutes).collect();
    minutes.sort_unstable();

    let total_minutes = saturating_sum(minutes.iter().copied());
    let billed_minutes = saturating_sum(
        entries
            .iter()
            .filter(|e| e.billed)
            .map(TimeEntry::duration_minutes),
    );
    let count = minutes.len();
    let average_minutes = minutes.iter().map(|&m| m as f64).sum::<f64>() / count as f64;

    let median_minutes = if count % 2 == 1 {
        minutes[count / 2] as f64
    } else {
        (minutes[count / 2 - 1] as f64 + minutes[count / 2] as f64) / 2.0
    };

    let std_dev_minutes = (count > 1).then(|| {
        let variance = minutes
            .iter()
            .map(|&m| (m as f64 - average_minutes).powi(2))
            .sum::<f64>()
            / (count - 1) as f64;
        variance.sqrt()
    });

    let first_date = entries.iter().map(|e| e.start_date).min();
    let last_date = entries.iter().map(|e| e.start_date).max();
    let date_range_days = match (first_date, last_date) {
        (Some(first), Some(last)) => (last - first).num_days() + 1,
        _ => 0,
    };

    SummaryStatistics {
        total_entries: count,
        total_minutes,
        billed_minutes,
        unbilled_minutes: total_minutes.saturating_sub(billed_minutes),
        billed_percentage: if total_minutes > 0 {
            billed_minutes as f64 / total_minutes as f64 * 100.0
        } else {
            0.0
        },
        average_minutes,
        min_minutes: minutes[0],
        max_minutes: minutes[count - 1],
        median_minutes,
        std_dev_minutes,
        customer_count: distinct(entries.iter().map(|e| e.customer.as_str())),
        project_count: distinct(entries.iter().map(|e| e.assignment.as_str())),
        team_member_count: distinct(entries.iter().map(|e| e.team_member.as_str())),
        first_date,
        last_date,
        date_range_days,
    }
}

fn saturating_sum(values: impl Iterator<Item = u64>) -> u64 {
    values.fold(0, u64::saturating_add)
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> usize {
    values
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntrySource;
    use pretty_assertions::assert_eq;

    fn entry(member: &str, assignment: &str, day: u32, duration: &str, billed: bool) -> TimeEntry {
        TimeEntry::new(
            member.to_string(),
            "ACME".to_string(),
            "Fibu".to_string(),
            NaiveDate::from_ymd_opt(2025, 4, day).unwrap(),
            duration.to_string(),
            EntrySource::CsvImport,
        )
        .with_assignment(assignment.to_string())
        .with_billed(billed)
    }

    #[test]
    fn test_empty_summary() {
        let summary = compute_summary_statistics(&[]);
        assert_eq!(summary, SummaryStatistics::default());
        assert_eq!(summary.first_date, None);
        assert_eq!(summary.std_dev_minutes, None);
    }

    #[test]
    fn test_summary_figures() {
        let entries = vec![
            entry("Alice", "04.2025", 1, "1h 0m 0s", true),
            entry("Bob", "04.2025", 3, "0h 30m 0s", false),
            entry("Alice", "05.2025", 10, "1h 30m 0s", false),
        ];
        let summary = compute_summary_statistics(&entries);

        assert_eq!(summary.total_entries, 3);
        assert_eq!(summary.total_minutes, 180);
        assert_eq!(summary.billed_minutes, 60);
        assert_eq!(summary.unbilled_minutes, 120);
        assert!((summary.billed_percentage - 33.333).abs() < 0.01);
        assert_eq!(summary.average_minutes, 60.0);
        assert_eq!(summary.min_minutes, 30);
        assert_eq!(summary.max_minutes, 90);
        assert_eq!(summary.median_minutes, 60.0);
        assert_eq!(summary.std_dev_minutes, Some(30.0));
        assert_eq!(summary.customer_count, 1);
        assert_eq!(summary.project_count, 2);
        assert_eq!(summary.team_member_count, 2);
        assert_eq!(summary.first_date, NaiveDate::from_ymd_opt(2025, 4, 1));
        assert_eq!(summary.last_date, NaiveDate::from_ymd_opt(2025, 4, 10));
        assert_eq!(summary.date_range_days, 10);
        assert_eq!(summary.total_hours(), 3.0);
    }

    #[test]
    fn test_single_entry() {
        let summary = compute_summary_statistics(&[entry("Alice", "", 5, "45m", false)]);
        assert_eq!(summary.median_minutes, 45.0);
        assert_eq!(summary.std_dev_minutes, None);
        assert_eq!(summary.project_count, 0);
        assert_eq!(summary.date_range_days, 1);
        assert_eq!(summary.billed_percentage, 0.0);
    }

    #[test]
    fn test_even_count_median() {
        let entries = vec![
            entry("Alice", "", 1, "10m", false),
            entry("Alice", "", 1, "20m", false),
            entry("Alice", "", 1, "40m", false),
            entry("Alice", "", 1, "50m", false),
        ];
        assert_eq!(compute_summary_statistics(&entries).median_minutes, 30.0);
    }

    #[test]
    fn test_huge_durations_saturate() {
        let entries: Vec<TimeEntry> = (0..70)
            .map(|_| entry("Alice", "", 1, "9999999999999999h", true))
            .collect();
        let summary = compute_summary_statistics(&entries);
        assert_eq!(summary.total_entries, 70);
        assert_eq!(summary.total_minutes, u64::MAX);
        assert_eq!(summary.billed_minutes, u64::MAX);
        assert_eq!(summary.unbilled_minutes, 0);
        assert!(summary.median_minutes > 0.0);
    }
}
