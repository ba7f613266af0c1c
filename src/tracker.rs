//! Manual time entries.
//!
//! A draft is what the entry form holds: the selected team member, customer
//! and project, free-text Auftrag and notes, and the tracked duration.
//! Saving a draft without an id creates an entry; saving one with an id
//! edits that entry in place.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

use crate::codec::WorkDuration;
use crate::ingest::DEFAULT_DURATION;
use crate::models::{EntryId, EntrySource, TimeEntry};
use crate::storage::{EntryStore, KeyValueStore, StorageError};
use crate::table::{extract_unique_values, form_columns, CsvTable};

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Missing selection: {0}")]
    MissingSelection(&'static str),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryDraft {
    /// Set when editing an existing entry
    pub id: Option<EntryId>,
    pub team_member: String,
    pub customer: String,
    pub project: String,
    pub assignment: String,
    pub notes: String,
    pub duration: Option<WorkDuration>,
}

impl EntryDraft {
    /// Prefill a draft from a stored entry, as the edit form does.
    pub fn from_entry(entry: &TimeEntry) -> Self {
        Self {
            id: Some(entry.id.clone()),
            team_member: entry.team_member.clone(),
            customer: entry.customer.clone(),
            project: entry.project.clone(),
            assignment: entry.assignment.clone(),
            notes: entry.notes.clone(),
            duration: WorkDuration::parse(&entry.duration),
        }
    }

    /// Team member, customer and project must be selected.
    pub fn validate(&self) -> Result<(), TrackerError> {
        let required = [
            ("team member", &self.team_member),
            ("customer", &self.customer),
            ("project", &self.project),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(TrackerError::MissingSelection(name));
            }
        }
        Ok(())
    }

    fn duration_text(&self) -> Option<String> {
        self.duration.map(|d| d.to_hhmmss())
    }
}

/// Create or edit an entry from a draft and persist the store.
///
/// New entries are dated `today`, unbilled and marked as manual. Edits keep
/// the id, dates, billed flag and source of the stored entry; the duration
/// is only replaced when the draft carries one.
pub fn save_draft<S: KeyValueStore>(
    store: &mut EntryStore<S>,
    draft: EntryDraft,
    today: NaiveDate,
) -> Result<TimeEntry, TrackerError> {
    draft.validate()?;

    let entry = match &draft.id {
        None => {
            let duration = draft
                .duration_text()
                .unwrap_or_else(|| DEFAULT_DURATION.to_string());
            let entry = TimeEntry::new(
                draft.team_member.trim().to_string(),
                draft.customer.trim().to_string(),
                draft.project.trim().to_string(),
                today,
                duration,
                EntrySource::ManualEntry,
            )
            .with_assignment(draft.assignment.trim().to_string())
            .with_notes(draft.notes.trim().to_string());

            store.add(entry.clone())?;
            info!("Created manual entry {}", entry.id);
            entry
        }
        Some(id) => {
            let mut entry = store
                .get(id.as_str())
                .cloned()
                .ok_or_else(|| StorageError::EntryNotFound(id.to_string()))?;

            entry.team_member = draft.team_member.trim().to_string();
            entry.customer = draft.customer.trim().to_string();
            entry.project = draft.project.trim().to_string();
            entry.assignment = draft.assignment.trim().to_string();
            entry.notes = draft.notes.trim().to_string();
            if let Some(duration) = draft.duration_text() {
                entry.duration = duration;
            }
            entry.touch();

            store.update(entry.clone())?;
            info!("Updated entry {}", entry.id);
            entry
        }
    };

    Ok(entry)
}

/// Choices offered by the entry form, read from a CSV load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFormOptions {
    pub team_members: Vec<String>,
    pub customers: Vec<String>,
    pub projects: Vec<String>,
}

impl EntryFormOptions {
    pub fn from_table(table: &CsvTable) -> Self {
        let values = |index: Option<usize>| {
            index
                .map(|i| extract_unique_values(&table.rows, i))
                .unwrap_or_default()
        };
        Self {
            team_members: values(form_columns::TEAM.resolve(&table.headers)),
            customers: values(form_columns::CUSTOMER.resolve(&table.headers)),
            projects: values(form_columns::PROJECT.resolve(&table.headers)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, DEFAULT_ENTRIES_KEY};
    use pretty_assertions::assert_eq;

    fn store() -> EntryStore<MemoryStore> {
        EntryStore::open(MemoryStore::new(), DEFAULT_ENTRIES_KEY).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    fn draft() -> EntryDraft {
        EntryDraft {
            team_member: "Alice".to_string(),
            customer: "ACME".to_string(),
            project: "Fibu".to_string(),
            assignment: "05.2025".to_string(),
            duration: Some(WorkDuration::from_seconds(5400)),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_selection() {
        let mut store = store();
        let mut d = draft();
        d.customer = "  ".to_string();
        let err = save_draft(&mut store, d, today()).unwrap_err();
        assert!(matches!(err, TrackerError::MissingSelection("customer")));
        assert!(store.is_empty());
    }

    #[test]
    fn test_create_entry() {
        let mut store = store();
        let entry = save_draft(&mut store, draft(), today()).unwrap();
        assert_eq!(entry.duration, "01:30:00");
        assert_eq!(entry.start_date, today());
        assert_eq!(entry.end_date, today());
        assert_eq!(entry.source, EntrySource::ManualEntry);
        assert!(!entry.billed);
        assert_eq!(entry.duration_minutes(), 90);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_create_without_duration() {
        let mut store = store();
        let mut d = draft();
        d.duration = None;
        let entry = save_draft(&mut store, d, today()).unwrap();
        assert_eq!(entry.duration, "00:00");
    }

    #[test]
    fn test_edit_keeps_identity_dates_and_billing() {
        let mut store = store();
        let created = save_draft(&mut store, draft(), today()).unwrap();
        store.toggle_billed(created.id.as_str()).unwrap();

        let mut edit = EntryDraft::from_entry(store.get(created.id.as_str()).unwrap());
        edit.notes = "Nachtrag".to_string();
        edit.duration = None;
        let later = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let edited = save_draft(&mut store, edit, later).unwrap();

        assert_eq!(edited.id, created.id);
        assert_eq!(edited.start_date, today());
        assert!(edited.billed);
        assert_eq!(edited.duration, "01:30:00");
        assert_eq!(edited.notes, "Nachtrag");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_edit_unknown_id() {
        let mut store = store();
        let mut d = draft();
        d.id = Some(EntryId::from("missing"));
        let err = save_draft(&mut store, d, today()).unwrap_err();
        assert!(matches!(
            err,
            TrackerError::Storage(StorageError::EntryNotFound(_))
        ));
    }

    #[test]
    fn test_form_options_from_table() {
        let table = CsvTable::parse(
            "Teammitglied,Kunden,Projekt\n\
             Bob,ACME,Fibu\n\
             Alice,Initech,Fibu\n\
             Alice,,Beratung\n",
        );
        let options = EntryFormOptions::from_table(&table);
        assert_eq!(options.team_members, vec!["Alice", "Bob"]);
        assert_eq!(options.customers, vec!["ACME", "Initech"]);
        assert_eq!(options.projects, vec!["Beratung", "Fibu"]);
    }

    #[test]
    fn test_form_options_use_positional_fallbacks() {
        let table = CsvTable::parse("A,B,C\nx,y,z\n");
        let options = EntryFormOptions::from_table(&table);
        assert_eq!(options.team_members, vec!["x"]);
        assert_eq!(options.customers, vec!["y"]);
        assert_eq!(options.projects, vec!["z"]);
    }
}
