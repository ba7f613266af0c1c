//! Duration parsing and formatting.

use std::fmt;
use std::ops::Add;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static HOURS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)h").expect("valid hours regex"));

static MINUTES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)m").expect("valid minutes regex"));

static SECONDS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)s").expect("valid seconds regex"));

/// "2h 5m" or "2h 5m 30s" as one compound match.
static COMPOUND_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+)h\s*(\d+)m(?:\s*\d+s)?").expect("valid compound duration regex")
});

/// Timer/clock form: "01:30" or "01:30:45".
static CLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+):(\d{1,2})(?::(\d{1,2}))?$").expect("valid clock duration regex")
});

/// A span of tracked work, stored as whole seconds.
///
/// The two render functions make the precision a call-site decision:
/// tables and statistics use [`WorkDuration::to_hhmm`], the timer uses
/// [`WorkDuration::to_hhmmss`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct WorkDuration {
    seconds: u64,
}

impl WorkDuration {
    pub const ZERO: WorkDuration = WorkDuration { seconds: 0 };

    pub fn from_seconds(seconds: u64) -> Self {
        Self { seconds }
    }

    pub fn from_minutes(minutes: u64) -> Self {
        Self {
            seconds: minutes.saturating_mul(60),
        }
    }

    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    /// Whole minutes, with a remaining half minute rounded up.
    pub fn minutes(&self) -> u64 {
        self.seconds.saturating_add(30) / 60
    }

    /// Parse unit text such as "1h 32m 00s".
    ///
    /// Each unit is scanned independently, so the parts may appear in any
    /// order and stray text between them is ignored. Returns `None` when no
    /// unit is present at all.
    pub fn from_unit_text(text: &str) -> Option<Self> {
        let hours = first_number(&HOURS_RE, text);
        let minutes = first_number(&MINUTES_RE, text);
        let seconds = first_number(&SECONDS_RE, text);

        if hours.is_none() && minutes.is_none() && seconds.is_none() {
            return None;
        }

        let total = hours
            .unwrap_or(0)
            .saturating_mul(3600)
            .saturating_add(minutes.unwrap_or(0).saturating_mul(60))
            .saturating_add(seconds.unwrap_or(0));
        Some(Self::from_seconds(total))
    }

    /// Parse clock text such as "01:30" or "01:30:45".
    pub fn from_clock_text(text: &str) -> Option<Self> {
        let caps = CLOCK_RE.captures(text.trim())?;
        let hours: u64 = caps[1].parse().ok()?;
        let minutes: u64 = caps[2].parse().ok()?;
        let seconds: u64 = match caps.get(3) {
            Some(s) => s.as_str().parse().ok()?,
            None => 0,
        };
        Some(Self::from_seconds(
            hours
                .saturating_mul(3600)
                .saturating_add(minutes.saturating_mul(60))
                .saturating_add(seconds),
        ))
    }

    /// Parse any duration spelling found in stored entries: clock form first,
    /// then unit form.
    pub fn parse(text: &str) -> Option<Self> {
        Self::from_clock_text(text).or_else(|| Self::from_unit_text(text))
    }

    /// `HH:MM`, seconds dropped.
    pub fn to_hhmm(&self) -> String {
        format!("{:02}:{:02}", self.seconds / 3600, (self.seconds % 3600) / 60)
    }

    /// `HH:MM:SS`.
    pub fn to_hhmmss(&self) -> String {
        format!(
            "{:02}:{:02}:{:02}",
            self.seconds / 3600,
            (self.seconds % 3600) / 60,
            self.seconds % 60
        )
    }
}

impl Add for WorkDuration {
    type Output = WorkDuration;

    fn add(self, rhs: WorkDuration) -> WorkDuration {
        WorkDuration::from_seconds(self.seconds.saturating_add(rhs.seconds))
    }
}

impl fmt::Display for WorkDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hhmm())
    }
}

fn first_number(re: &Regex, text: &str) -> Option<u64> {
    re.captures(text).and_then(|caps| caps[1].parse().ok())
}

/// Minutes in unit text ("2h 15m 30s" → 136). Text without any unit is 0.
pub fn parse_duration_to_minutes(text: &str) -> u64 {
    WorkDuration::from_unit_text(text)
        .map(|d| d.minutes())
        .unwrap_or(0)
}

/// Minutes in any stored duration spelling, clock or unit form. Unparsable
/// text is 0.
pub fn duration_text_to_minutes(text: &str) -> u64 {
    WorkDuration::parse(text).map(|d| d.minutes()).unwrap_or(0)
}

/// Render "2h 5m" (optionally followed by seconds) as "02:05".
///
/// Text that does not contain the compound pattern is returned unchanged.
pub fn format_duration_to_hhmm(text: &str) -> String {
    match COMPOUND_RE.captures(text) {
        Some(caps) => format!("{:0>2}:{:0>2}", &caps[1], &caps[2]),
        None => text.to_string(),
    }
}

/// Render a minute count as `HH:MM`. Negative counts render as "00:00".
pub fn format_minutes_to_hhmm(minutes: i64) -> String {
    let minutes = minutes.max(0);
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}
