//! Month extraction from Auftrag (order) codes.

use once_cell::sync::Lazy;
use regex::Regex;

/// Month/year codes, paired with the capture group holding the month.
static MONTH_YEAR_PATTERNS: Lazy<Vec<(Regex, usize)>> = Lazy::new(|| {
    [
        (r"^(\d{1,2})\.(\d{4})$", 1),       // 04.2025
        (r"^(\d{1,2})/(\d{4})$", 1),        // 04/2025
        (r"^(\d{1,2})-(\d{4})$", 1),        // 04-2025
        (r"^(\d{4})[-/.](\d{1,2})$", 2),    // 2025-04, 2025/04, 2025.04
    ]
    .iter()
    .map(|(p, group)| (Regex::new(p).expect("valid month regex"), *group))
    .collect()
});

static BARE_MONTH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})$").expect("valid bare month regex"));

// Whole words only, longest numeral first, so "III" never reads as "I".
static ROMAN_MONTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(XII|XI|X|IX|VIII|VII|VI|V|IV|III|II|I)\b").expect("valid roman month regex")
});

fn month_in_range(month: u32) -> Option<u32> {
    (1..=12).contains(&month).then_some(month)
}

fn roman_value(numeral: &str) -> Option<u32> {
    let value = match numeral {
        "I" => 1,
        "II" => 2,
        "III" => 3,
        "IV" => 4,
        "V" => 5,
        "VI" => 6,
        "VII" => 7,
        "VIII" => 8,
        "IX" => 9,
        "X" => 10,
        "XI" => 11,
        "XII" => 12,
        _ => return None,
    };
    Some(value)
}

/// Extract a month (1-12) from an Auftrag code.
///
/// Tries month/year codes ("04.2025", "4/2025", "04-2025", "2025.04"), then a
/// bare month number ("4"), then a Roman numeral word ("Q-IV"). Returns
/// `None` when nothing yields a month in range.
pub fn extract_month_from_auftrag(code: &str) -> Option<u32> {
    let code = code.trim();
    if code.is_empty() {
        return None;
    }

    for (re, group) in MONTH_YEAR_PATTERNS.iter() {
        let month = re
            .captures(code)
            .and_then(|caps| caps[*group].parse::<u32>().ok())
            .and_then(month_in_range);
        if month.is_some() {
            return month;
        }
    }

    if let Some(caps) = BARE_MONTH_RE.captures(code) {
        if let Some(month) = caps[1].parse::<u32>().ok().and_then(month_in_range) {
            return Some(month);
        }
    }

    ROMAN_MONTH_RE
        .captures(code)
        .and_then(|caps| roman_value(&caps[1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_year_codes() {
        assert_eq!(extract_month_from_auftrag("04.2025"), Some(4));
        assert_eq!(extract_month_from_auftrag("4/2025"), Some(4));
        assert_eq!(extract_month_from_auftrag("04-2025"), Some(4));
        assert_eq!(extract_month_from_auftrag("2025.04"), Some(4));
        assert_eq!(extract_month_from_auftrag("2025-11"), Some(11));
        assert_eq!(extract_month_from_auftrag("2025/1"), Some(1));
    }

    #[test]
    fn test_bare_month() {
        assert_eq!(extract_month_from_auftrag("4"), Some(4));
        assert_eq!(extract_month_from_auftrag("12"), Some(12));
    }

    #[test]
    fn test_out_of_range_and_empty() {
        assert_eq!(extract_month_from_auftrag(""), None);
        assert_eq!(extract_month_from_auftrag("13"), None);
        assert_eq!(extract_month_from_auftrag("0"), None);
        assert_eq!(extract_month_from_auftrag("13.2025"), None);
    }

    #[test]
    fn test_roman_numerals() {
        assert_eq!(extract_month_from_auftrag("Abschluss IV"), Some(4));
        assert_eq!(extract_month_from_auftrag("Q-III"), Some(3));
        assert_eq!(extract_month_from_auftrag("XII/Jahresende"), Some(12));
        assert_eq!(extract_month_from_auftrag("VIII"), Some(8));
    }

    #[test]
    fn test_roman_numerals_whole_words_only() {
        // Capital letters inside ordinary words are not numerals.
        assert_eq!(extract_month_from_auftrag("INTERN"), None);
        assert_eq!(extract_month_from_auftrag("MIX"), None);
        assert_eq!(extract_month_from_auftrag("lowercase iv"), None);
    }

    #[test]
    fn test_unrelated_text() {
        assert_eq!(extract_month_from_auftrag("Projekt Alpha"), None);
    }
}
