//! Date parsing for exported time sheets.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// Tried in order; the first pattern that matches decides the result.
static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^(\d{2})\.(\d{2})\.(\d{4})$",     // DD.MM.YYYY
        r"^(\d{2})/(\d{2})/(\d{4})$",       // DD/MM/YYYY
        r"^(\d{1,2})\.(\d{1,2})\.(\d{4})$", // D.M.YYYY
        r"^(\d{1,2})/(\d{1,2})/(\d{4})$",   // D/M/YYYY
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid date regex"))
    .collect()
});

/// Parse a day-first date ("05.03.2024", "5/3/2024").
///
/// Returns `None` when no pattern matches, or when the matched numbers do not
/// form a calendar date ("31.02.2024").
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let caps = DATE_PATTERNS.iter().find_map(|re| re.captures(text))?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse an ISO `YYYY-MM-DD` date.
pub fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

/// Day-first formats first, then ISO.
pub fn parse_any_date(text: &str) -> Option<NaiveDate> {
    parse_date(text).or_else(|| parse_iso_date(text))
}

pub fn format_date_for_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// German display form, e.g. "5.3.2024".
pub fn format_date_de(date: NaiveDate) -> String {
    date.format("%-d.%-m.%Y").to_string()
}
