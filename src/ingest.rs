//! CSV import into the entry store.
//!
//! Maps raw rows onto [`TimeEntry`] records and merges them with the
//! entries already stored.

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::codec::parse_date;
use crate::models::{ContentKey, EntryId, EntrySource, TimeEntry};
use crate::table::{clean_cell, find_duration_column, import_columns, is_billed_value, CsvTable};

/// Team member recorded when the row names nobody.
pub const UNKNOWN_MEMBER: &str = "Unknown";

/// Duration recorded when the row has none.
pub const DEFAULT_DURATION: &str = "00:00";

/// Reasons a single row is skipped during import.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowError {
    #[error("row {0} has no content")]
    Empty(usize),
}

/// Column positions used by the import, resolved once per CSV load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportColumns {
    pub team: Option<usize>,
    pub customer: Option<usize>,
    pub project: Option<usize>,
    pub assignment: Option<usize>,
    pub notes: Option<usize>,
    pub start_date: Option<usize>,
    pub duration: Option<usize>,
    pub billed: Option<usize>,
}

impl ImportColumns {
    pub fn resolve(headers: &[String]) -> Self {
        Self {
            team: import_columns::TEAM.resolve(headers),
            customer: import_columns::CUSTOMER.resolve(headers),
            project: import_columns::PROJECT.resolve(headers),
            assignment: import_columns::ASSIGNMENT.resolve(headers),
            notes: import_columns::NOTES.resolve(headers),
            start_date: import_columns::START_DATE.resolve(headers),
            duration: find_duration_column(headers),
            billed: import_columns::BILLED.resolve(headers),
        }
    }
}

/// How imported entries are matched against stored ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DedupPolicy {
    /// Skip imported entries whose id is already stored. Imported ids are
    /// freshly generated, so re-importing a file duplicates its rows.
    #[default]
    ById,
    /// Skip imported entries whose team member, project, Auftrag, start date
    /// and duration match an entry already stored.
    ByContent,
}

/// Result of merging an import into the stored entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    pub entries: Vec<TimeEntry>,
    pub added: usize,
    pub skipped: usize,
}

/// Build one entry from a raw row.
pub fn entry_from_row(
    row_index: usize,
    row: &[String],
    columns: &ImportColumns,
    today: NaiveDate,
    timestamp: i64,
) -> Result<TimeEntry, RowError> {
    if row.iter().all(|c| c.replace('"', "").trim().is_empty()) {
        return Err(RowError::Empty(row_index));
    }

    let text = |index: Option<usize>| clean_cell(row, index).unwrap_or_default();

    let team_member =
        clean_cell(row, columns.team).unwrap_or_else(|| UNKNOWN_MEMBER.to_string());
    let start_date = clean_cell(row, columns.start_date)
        .and_then(|s| parse_date(&s))
        .unwrap_or(today);
    let duration =
        clean_cell(row, columns.duration).unwrap_or_else(|| DEFAULT_DURATION.to_string());
    let billed = clean_cell(row, columns.billed)
        .map(|s| is_billed_value(&s))
        .unwrap_or(false);

    let mut entry = TimeEntry::new(
        team_member,
        text(columns.customer),
        text(columns.project),
        start_date,
        duration,
        EntrySource::CsvImport,
    )
    .with_assignment(text(columns.assignment))
    .with_notes(text(columns.notes))
    .with_billed(billed);
    entry.timestamp = timestamp;

    Ok(entry)
}

/// Map every data row to an entry. Rows that cannot be mapped are logged
/// and skipped; the rest of the import continues.
///
/// A row whose cells are all blank (e.g. `,,,`) counts as malformed and is
/// skipped, so it never turns into an `Unknown` / `00:00` entry. The result
/// can therefore hold fewer entries than `rows`.
pub fn import_rows_to_entries(
    headers: &[String],
    rows: &[Vec<String>],
    today: NaiveDate,
) -> Vec<TimeEntry> {
    let columns = ImportColumns::resolve(headers);
    debug!("Import columns: {:?}", columns);

    let timestamp = Utc::now().timestamp_millis();
    rows.iter()
        .enumerate()
        .filter_map(
            |(i, row)| match entry_from_row(i, row, &columns, today, timestamp) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping CSV row: {}", e);
                    None
                }
            },
        )
        .collect()
}

/// Convenience wrapper over [`import_rows_to_entries`] for a parsed table.
pub fn import_table(table: &CsvTable, today: NaiveDate) -> Vec<TimeEntry> {
    import_rows_to_entries(&table.headers, &table.rows, today)
}

/// Append imported entries to the existing ones.
///
/// Existing entries are kept in order; imported entries follow in import
/// order. An imported entry is skipped when the policy finds it already
/// present, and never added twice within one import.
pub fn merge_into_store(
    existing: Vec<TimeEntry>,
    imported: Vec<TimeEntry>,
    policy: DedupPolicy,
) -> MergeOutcome {
    let mut seen_ids: HashSet<EntryId> = existing.iter().map(|e| e.id.clone()).collect();
    let mut seen_content: HashSet<ContentKey> = match policy {
        DedupPolicy::ById => HashSet::new(),
        DedupPolicy::ByContent => existing.iter().map(TimeEntry::content_key).collect(),
    };

    let mut entries = existing;
    let mut added = 0;
    let mut skipped = 0;

    for entry in imported {
        let duplicate_content =
            policy == DedupPolicy::ByContent && !seen_content.insert(entry.content_key());
        if duplicate_content || !seen_ids.insert(entry.id.clone()) {
            skipped += 1;
            continue;
        }
        entries.push(entry);
        added += 1;
    }

    info!(
        "Merged import: {} added, {} skipped, {} total",
        added,
        skipped,
        entries.len()
    );

    MergeOutcome {
        entries,
        added,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const EXPORT: &str = "\"Teammitglied\",\"Kunden\",\"Projekt\",\"Auftrag\",\"Start Date\",\"End Date\",\"Dauer\",\"Abgerechnet\",\"Notizen\"\n\
                          \"Alice\",\"ACME\",\"Finanzbuchführung\",\"04.2025\",\"02.04.2025\",\"02.04.2025\",\"1h 30m 0s\",\"ja\",\"Abschluss\"\n\
                          \"Bob\",\"Initech\",\"Beratung\",\"\",\"kaputt\",\"\",\"0h 45m 0s\",\"nein\",\"\"\n";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn test_resolve_columns() {
        let table = CsvTable::parse(EXPORT);
        let columns = ImportColumns::resolve(&table.headers);
        assert_eq!(columns.team, Some(0));
        assert_eq!(columns.customer, Some(1));
        assert_eq!(columns.project, Some(2));
        assert_eq!(columns.assignment, Some(3));
        assert_eq!(columns.start_date, Some(4));
        assert_eq!(columns.duration, Some(6));
        assert_eq!(columns.billed, Some(7));
        assert_eq!(columns.notes, Some(8));
    }

    #[test]
    fn test_import_maps_fields() {
        let entries = import_table(&CsvTable::parse(EXPORT), today());
        assert_eq!(entries.len(), 2);

        let alice = &entries[0];
        assert_eq!(alice.team_member, "Alice");
        assert_eq!(alice.customer, "ACME");
        assert_eq!(alice.project, "Finanzbuchführung");
        assert_eq!(alice.assignment, "04.2025");
        assert_eq!(alice.notes, "Abschluss");
        assert_eq!(alice.start_date, NaiveDate::from_ymd_opt(2025, 4, 2).unwrap());
        assert_eq!(alice.end_date, alice.start_date);
        assert_eq!(alice.duration, "1h 30m 0s");
        assert!(alice.billed);
        assert_eq!(alice.source, EntrySource::CsvImport);
    }

    #[test]
    fn test_import_unparsable_date_falls_back_to_today() {
        let entries = import_table(&CsvTable::parse(EXPORT), today());
        let bob = &entries[1];
        assert_eq!(bob.start_date, today());
        assert_eq!(bob.end_date, today());
        assert!(!bob.billed);
        assert_eq!(bob.assignment, "");
    }

    #[test]
    fn test_import_defaults_for_missing_columns() {
        let table = CsvTable::parse("Beschreibung\nirgendwas\n");
        let entries = import_table(&table, today());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].team_member, UNKNOWN_MEMBER);
        assert_eq!(entries[0].duration, DEFAULT_DURATION);
        assert_eq!(entries[0].customer, "");
        assert!(!entries[0].billed);
        assert_eq!(entries[0].start_date, today());
    }

    #[test]
    fn test_import_skips_empty_rows() {
        let table = CsvTable::parse("Team,Dauer\n,\nAlice,1h 0m\n\"\",\"\"\n,,,\n");
        let entries = import_table(&table, today());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].team_member, "Alice");
    }

    #[test]
    fn test_import_short_row() {
        let table = CsvTable::parse("Team,Kunde,Dauer\nAlice\n");
        let entries = import_table(&table, today());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].duration, DEFAULT_DURATION);
    }

    #[test]
    fn test_import_ids_unique() {
        let entries = import_table(&CsvTable::parse(EXPORT), today());
        assert_ne!(entries[0].id, entries[1].id);
    }

    #[test]
    fn test_import_empty_table() {
        assert!(import_table(&CsvTable::parse(""), today()).is_empty());
    }

    #[test]
    fn test_merge_by_id_repeat_import_duplicates_rows() {
        let table = CsvTable::parse(EXPORT);
        let first = merge_into_store(Vec::new(), import_table(&table, today()), DedupPolicy::ById);
        let second = merge_into_store(
            first.entries,
            import_table(&table, today()),
            DedupPolicy::ById,
        );
        assert_eq!(second.entries.len(), 4);
        assert_eq!(second.added, 2);
        assert_eq!(second.skipped, 0);
    }

    #[test]
    fn test_merge_by_id_skips_colliding_ids() {
        let existing = import_table(&CsvTable::parse(EXPORT), today());
        let mut imported = import_table(&CsvTable::parse(EXPORT), today());
        imported[0].id = existing[1].id.clone();

        let outcome = merge_into_store(existing.clone(), imported, DedupPolicy::ById);
        assert_eq!(outcome.added, 1);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(&outcome.entries[..2], &existing[..]);
    }

    #[test]
    fn test_merge_never_adds_same_id_twice() {
        let mut imported = import_table(&CsvTable::parse(EXPORT), today());
        imported[1].id = imported[0].id.clone();
        let outcome = merge_into_store(Vec::new(), imported, DedupPolicy::ById);
        assert_eq!(outcome.entries.len(), 1);
    }

    #[test]
    fn test_merge_by_content_skips_repeat_import() {
        let table = CsvTable::parse(EXPORT);
        let first = merge_into_store(
            Vec::new(),
            import_table(&table, today()),
            DedupPolicy::ByContent,
        );
        let second = merge_into_store(
            first.entries,
            import_table(&table, today()),
            DedupPolicy::ByContent,
        );
        assert_eq!(second.entries.len(), 2);
        assert_eq!(second.skipped, 2);
    }
}
