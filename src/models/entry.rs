//! Time entry model.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{ContentKey, EntryId};
use crate::codec::{duration_text_to_minutes, format_date_for_iso, parse_any_date};

/// Where an entry came from. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EntrySource {
    CsvImport,
    /// Also assumed for stored entries that predate the field.
    #[default]
    ManualEntry,
}

impl std::fmt::Display for EntrySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntrySource::CsvImport => write!(f, "csv_import"),
            EntrySource::ManualEntry => write!(f, "manual_entry"),
        }
    }
}

fn serialize_stored_date<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&format_date_for_iso(*date))
}

/// Dates are written as ISO text; day-first text is accepted on read.
fn deserialize_stored_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_any_date(&text)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {:?}", text)))
}

/// One tracked block of work, as persisted in the entry store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    /// Unique identifier, never reassigned
    pub id: EntryId,

    pub team_member: String,

    #[serde(default)]
    pub customer: String,

    #[serde(default)]
    pub project: String,

    /// Auftrag (order) code, may encode a month
    #[serde(default)]
    pub assignment: String,

    #[serde(default)]
    pub notes: String,

    #[serde(
        serialize_with = "serialize_stored_date",
        deserialize_with = "deserialize_stored_date"
    )]
    pub start_date: NaiveDate,

    #[serde(
        serialize_with = "serialize_stored_date",
        deserialize_with = "deserialize_stored_date"
    )]
    pub end_date: NaiveDate,

    /// Display form: "HH:MM", "HH:MM:SS" or the imported text
    pub duration: String,

    #[serde(default)]
    pub billed: bool,

    /// Creation/modification instant, epoch milliseconds
    pub timestamp: i64,

    #[serde(default)]
    pub source: EntrySource,
}

impl TimeEntry {
    /// Create an unbilled entry with a fresh id; `end_date` mirrors `start_date`.
    pub fn new(
        team_member: String,
        customer: String,
        project: String,
        start_date: NaiveDate,
        duration: String,
        source: EntrySource,
    ) -> Self {
        Self {
            id: EntryId::generate(),
            team_member,
            customer,
            project,
            assignment: String::new(),
            notes: String::new(),
            start_date,
            end_date: start_date,
            duration,
            billed: false,
            timestamp: Utc::now().timestamp_millis(),
            source,
        }
    }

    pub fn with_assignment(mut self, assignment: String) -> Self {
        self.assignment = assignment;
        self
    }

    pub fn with_notes(mut self, notes: String) -> Self {
        self.notes = notes;
        self
    }

    pub fn with_billed(mut self, billed: bool) -> Self {
        self.billed = billed;
        self
    }

    /// Duration in whole minutes; unparsable text counts as 0.
    pub fn duration_minutes(&self) -> u64 {
        duration_text_to_minutes(&self.duration)
    }

    /// Key used by content-based deduplication.
    pub fn content_key(&self) -> ContentKey {
        ContentKey::from_fields(&[
            self.team_member.trim(),
            self.project.trim(),
            self.assignment.trim(),
            &self.start_date.to_string(),
            self.duration.trim(),
        ])
    }

    /// Refresh the modification timestamp.
    pub fn touch(&mut self) {
        self.timestamp = Utc::now().timestamp_millis();
    }
}
