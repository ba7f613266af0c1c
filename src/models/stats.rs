//! Derived statistics models.
//!
//! Recomputed from the entry set on demand and never persisted.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::codec::format_minutes_to_hhmm;

/// Reserved key of the aggregate bucket.
pub const TOTAL_KEY: &str = "__total__";

/// Label of the grand total row.
pub const TOTAL_LABEL: &str = "Gesamt";

/// Billed/unbilled minutes for one team member (or the aggregate).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinuteBucket {
    pub billed: u64,
    pub unbilled: u64,
    pub total: u64,
}

impl MinuteBucket {
    /// Counters saturate at `u64::MAX`.
    pub fn add(&mut self, minutes: u64, billed: bool) {
        if billed {
            self.billed = self.billed.saturating_add(minutes);
        } else {
            self.unbilled = self.unbilled.saturating_add(minutes);
        }
        self.total = self.total.saturating_add(minutes);
    }
}

/// Per team member statistics plus the aggregate bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamStats {
    pub members: BTreeMap<String, MinuteBucket>,
    pub total: MinuteBucket,
}

/// Column of the rendered team statistics table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamStatsColumn {
    Name,
    Unbilled,
    Billed,
    Total,
}

/// One rendered row of the team statistics table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamStatsRow {
    pub label: String,
    pub minutes: MinuteBucket,
    pub is_total: bool,
}

impl TeamStatsRow {
    pub fn unbilled_hhmm(&self) -> String {
        hhmm(self.minutes.unbilled)
    }

    pub fn billed_hhmm(&self) -> String {
        hhmm(self.minutes.billed)
    }

    pub fn total_hhmm(&self) -> String {
        hhmm(self.minutes.total)
    }
}

impl TeamStats {
    /// Start with a zeroed bucket per member name.
    pub fn with_members<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            members: members
                .into_iter()
                .map(|m| (m.into(), MinuteBucket::default()))
                .collect(),
            total: MinuteBucket::default(),
        }
    }

    /// Add minutes to a member bucket (when the member is known) and to the
    /// aggregate bucket.
    pub fn record(&mut self, member: &str, minutes: u64, billed: bool) {
        if let Some(bucket) = self.members.get_mut(member) {
            bucket.add(minutes, billed);
        }
        self.total.add(minutes, billed);
    }

    /// Look up a bucket; [`TOTAL_KEY`] yields the aggregate.
    pub fn get(&self, key: &str) -> Option<&MinuteBucket> {
        if key == TOTAL_KEY {
            Some(&self.total)
        } else {
            self.members.get(key)
        }
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Rows sorted by member name, followed by the grand total row when more
    /// than one member is present.
    pub fn rows(&self) -> Vec<TeamStatsRow> {
        self.sorted_rows(TeamStatsColumn::Name, true)
    }

    /// Member rows sorted by a column; the grand total row always stays last.
    pub fn sorted_rows(&self, column: TeamStatsColumn, ascending: bool) -> Vec<TeamStatsRow> {
        let mut rows: Vec<TeamStatsRow> = self
            .members
            .iter()
            .map(|(name, minutes)| TeamStatsRow {
                label: name.clone(),
                minutes: *minutes,
                is_total: false,
            })
            .collect();

        rows.sort_by(|a, b| {
            let ord = compare_rows(a, b, column);
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        });

        if self.members.len() > 1 {
            rows.push(TeamStatsRow {
                label: TOTAL_LABEL.to_string(),
                minutes: self.total,
                is_total: true,
            });
        }

        rows
    }
}

fn compare_rows(a: &TeamStatsRow, b: &TeamStatsRow, column: TeamStatsColumn) -> Ordering {
    match column {
        TeamStatsColumn::Name => a.label.cmp(&b.label),
        TeamStatsColumn::Unbilled => a.minutes.unbilled.cmp(&b.minutes.unbilled),
        TeamStatsColumn::Billed => a.minutes.billed.cmp(&b.minutes.billed),
        TeamStatsColumn::Total => a.minutes.total.cmp(&b.minutes.total),
    }
}

fn hhmm(minutes: u64) -> String {
    format_minutes_to_hhmm(i64::try_from(minutes).unwrap_or(i64::MAX))
}

/// Minutes per calendar month, index 0 = January.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTotals(pub [u64; 12]);

impl MonthlyTotals {
    /// Add minutes to a 0-based month index. Out of range indices are ignored.
    pub fn add(&mut self, month_index: usize, minutes: u64) {
        if let Some(slot) = self.0.get_mut(month_index) {
            *slot = slot.saturating_add(minutes);
        }
    }

    pub fn get(&self, month_index: usize) -> u64 {
        self.0.get(month_index).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.0.iter().fold(0, |acc, m| acc.saturating_add(*m))
    }

    /// `HH:MM` per month, empty for months without time.
    pub fn formatted(&self) -> [String; 12] {
        std::array::from_fn(|i| {
            if self.0[i] > 0 {
                hhmm(self.0[i])
            } else {
                String::new()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn two_member_stats() -> TeamStats {
        let mut stats = TeamStats::with_members(["Bob", "Alice"]);
        stats.record("Alice", 60, true);
        stats.record("Alice", 30, false);
        stats.record("Bob", 120, false);
        stats
    }

    #[test]
    fn test_counters_saturate() {
        let mut stats = TeamStats::with_members(["Alice"]);
        for _ in 0..70 {
            stats.record("Alice", u64::MAX / 50, true);
        }
        assert_eq!(stats.total.billed, u64::MAX);
        assert_eq!(stats.total.total, u64::MAX);
        assert!(!stats.rows()[0].total_hhmm().starts_with('-'));

        let mut totals = MonthlyTotals::default();
        totals.add(0, u64::MAX);
        totals.add(0, 1);
        totals.add(1, 5);
        assert_eq!(totals.get(0), u64::MAX);
        assert_eq!(totals.total(), u64::MAX);
    }

    #[test]
    fn test_bucket_add() {
        let mut bucket = MinuteBucket::default();
        bucket.add(60, true);
        bucket.add(15, false);
        assert_eq!(
            bucket,
            MinuteBucket {
                billed: 60,
                unbilled: 15,
                total: 75
            }
        );
    }

    #[test]
    fn test_record_unknown_member_only_counts_total() {
        let mut stats = TeamStats::with_members(["Alice"]);
        stats.record("Unknown", 45, false);
        assert_eq!(stats.get("Alice").unwrap().total, 0);
        assert_eq!(stats.get(TOTAL_KEY).unwrap().total, 45);
        assert!(stats.get("Unknown").is_none());
    }

    #[test]
    fn test_rows_sorted_with_total_last() {
        let rows = two_member_stats().rows();
        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Alice", "Bob", "Gesamt"]);
        assert!(rows[2].is_total);
        assert_eq!(rows[2].total_hhmm(), "03:30");
        assert_eq!(rows[0].billed_hhmm(), "01:00");
        assert_eq!(rows[0].unbilled_hhmm(), "00:30");
    }

    #[test]
    fn test_single_member_has_no_total_row() {
        let mut stats = TeamStats::with_members(["Alice"]);
        stats.record("Alice", 10, true);
        let rows = stats.rows();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].is_total);
    }

    #[test]
    fn test_sorted_rows_by_minutes_descending() {
        let rows = two_member_stats().sorted_rows(TeamStatsColumn::Total, false);
        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Bob", "Alice", "Gesamt"]);

        let rows = two_member_stats().sorted_rows(TeamStatsColumn::Billed, false);
        assert_eq!(rows[0].label, "Alice");
    }

    #[test]
    fn test_monthly_totals() {
        let mut totals = MonthlyTotals::default();
        totals.add(3, 90);
        totals.add(3, 30);
        totals.add(11, 5);
        totals.add(12, 1000);
        assert_eq!(totals.get(3), 120);
        assert_eq!(totals.total(), 125);

        let formatted = totals.formatted();
        assert_eq!(formatted[3], "02:00");
        assert_eq!(formatted[11], "00:05");
        assert_eq!(formatted[0], "");
    }
}
