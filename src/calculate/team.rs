//! Billed/unbilled minutes per team member.

use std::collections::BTreeSet;

use tracing::debug;

use super::{active_filter, CsvRecord, RecordColumns, StatRecord};
use crate::models::TeamStats;
use crate::table::CsvTable;

/// Fold records into per-member buckets plus the aggregate.
///
/// Buckets exist for every member named anywhere in `records`, also when
/// the project filter leaves them without minutes. Records of unnamed
/// members still count toward the aggregate.
pub fn compute_team_statistics<R: StatRecord>(
    records: &[R],
    project_filter: Option<&str>,
) -> TeamStats {
    let members: BTreeSet<&str> = records
        .iter()
        .map(StatRecord::team_member)
        .filter(|m| !m.is_empty())
        .collect();
    let mut stats = TeamStats::with_members(members);

    let project_filter = active_filter(project_filter);
    for record in records {
        if let Some(project) = project_filter {
            if !record.matches_project(project) {
                continue;
            }
        }

        let minutes = record.duration_minutes();
        if minutes > 0 {
            stats.record(record.team_member(), minutes, record.is_billed());
        }
    }

    debug!(
        "Team statistics over {} records: {} members, {} minutes",
        records.len(),
        stats.member_count(),
        stats.total.total
    );
    stats
}

/// Team statistics straight from a CSV load. `None` when the table has no
/// duration column.
pub fn team_statistics_from_table(
    table: &CsvTable,
    project_filter: Option<&str>,
) -> Option<TeamStats> {
    let columns = RecordColumns::for_team_stats(&table.headers)?;
    let records = CsvRecord::read_all(&table.rows, &columns);
    Some(compute_team_statistics(&records, project_filter))
}
