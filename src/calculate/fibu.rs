//! Monthly Fibu report: booked time, fee, average hourly wage and the
//! deviation between the entered fee and the fee the booked time is worth.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::codec::format_minutes_to_hhmm;
use crate::models::MonthlyTotals;

/// Leading decimal number; whatever follows it is ignored.
static LEADING_NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("valid number regex")
});

/// Sign of a fee deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviationKind {
    Positive,
    Negative,
    Even,
}

/// Entered fee minus exact fee.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Deviation {
    pub amount: f64,
    pub kind: DeviationKind,
}

impl Deviation {
    pub fn between(fee: f64, exact_fee: f64) -> Self {
        let amount = fee - exact_fee;
        // Classified on whole cents, as displayed.
        let cents = round2(amount);
        let kind = if cents > 0.0 {
            DeviationKind::Positive
        } else if cents < 0.0 {
            DeviationKind::Negative
        } else {
            DeviationKind::Even
        };
        Self { amount, kind }
    }
}

/// One month column of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FibuMonth {
    /// Calendar month, 1-12
    pub month: u32,
    pub minutes: u64,
    /// Booked time as `HH:MM`, empty without time
    pub time: String,
    pub fee: f64,
    pub billed_hours: f64,
    pub average_hourly_wage: Option<f64>,
    pub exact_fee: Option<f64>,
    pub deviation: Option<Deviation>,
}

impl FibuMonth {
    pub fn calculate(month: u32, minutes: u64, fee: f64, billed_hours: f64) -> Self {
        let average_hourly_wage = average_hourly_wage(fee, billed_hours);
        let exact_fee = average_hourly_wage.and_then(|wage| exact_fee(minutes, wage));
        let deviation = exact_fee
            .filter(|_| fee != 0.0)
            .map(|exact| Deviation::between(fee, exact));

        Self {
            month,
            minutes,
            time: if minutes > 0 {
                format_minutes_to_hhmm(i64::try_from(minutes).unwrap_or(i64::MAX))
            } else {
                String::new()
            },
            fee,
            billed_hours,
            average_hourly_wage,
            exact_fee,
            deviation,
        }
    }

    pub fn wage_text(&self) -> String {
        self.average_hourly_wage
            .map(|w| format!("{:.2} €/h", w))
            .unwrap_or_default()
    }

    pub fn exact_fee_text(&self) -> String {
        self.exact_fee.map(format_euro).unwrap_or_default()
    }

    pub fn deviation_text(&self) -> String {
        self.deviation
            .map(|d| format_euro(d.amount))
            .unwrap_or_default()
    }
}

/// All twelve months of one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FibuReport {
    pub months: Vec<FibuMonth>,
    pub total_minutes: u64,
}

impl FibuReport {
    /// Combine booked minutes with entered fees and billed hours, both keyed
    /// by calendar month (1-12). Months without input count as 0.
    pub fn build(
        totals: &MonthlyTotals,
        fees: &BTreeMap<u32, f64>,
        billed_hours: &BTreeMap<u32, f64>,
    ) -> Self {
        let months = (1..=12u32)
            .map(|month| {
                FibuMonth::calculate(
                    month,
                    totals.get(month as usize - 1),
                    fees.get(&month).copied().unwrap_or(0.0),
                    billed_hours.get(&month).copied().unwrap_or(0.0),
                )
            })
            .collect();

        Self {
            months,
            total_minutes: totals.total(),
        }
    }

    pub fn month(&self, month: u32) -> Option<&FibuMonth> {
        self.months.iter().find(|m| m.month == month)
    }
}

/// Fee divided by billed hours, rounded to cents. `None` unless both are
/// positive.
pub fn average_hourly_wage(fee: f64, billed_hours: f64) -> Option<f64> {
    (fee > 0.0 && billed_hours > 0.0).then(|| round2(fee / billed_hours))
}

/// Booked time valued at the hourly wage. `None` unless both are positive.
pub fn exact_fee(minutes: u64, hourly_wage: f64) -> Option<f64> {
    let hours = minutes as f64 / 60.0;
    (hours > 0.0 && hourly_wage > 0.0).then(|| hours * hourly_wage)
}

/// Read billed hours as typed into the report: "12:30" (hours and minutes)
/// or a decimal with comma or dot ("12,5", "12.5"). Each part is read up to
/// the end of its leading number, so "12h" is 12. Unreadable input is 0.
pub fn parse_hours_input(text: &str) -> f64 {
    let text = text.replace(',', ".");
    let hours = match text.split_once(':') {
        Some((h, m)) => match (leading_number(h), leading_number(m)) {
            (Some(h), Some(m)) => h + m / 60.0,
            _ => 0.0,
        },
        None => leading_number(&text).unwrap_or(0.0),
    };
    if hours.is_finite() {
        hours
    } else {
        0.0
    }
}

/// Read a money amount with comma or dot as decimal separator, up to the
/// end of the leading number ("1250,50 €" is 1250.5, "1.250,5" is 1.25).
/// Unreadable input is 0.
pub fn parse_amount_input(text: &str) -> f64 {
    leading_number(&text.replace(',', "."))
        .filter(|a| a.is_finite())
        .unwrap_or(0.0)
}

fn leading_number(text: &str) -> Option<f64> {
    LEADING_NUMBER_RE
        .find(text.trim_start())
        .and_then(|m| m.as_str().parse().ok())
}

pub fn format_euro(amount: f64) -> String {
    format!("{:.2} €", amount)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
