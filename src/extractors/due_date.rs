//! Due-date rule table for the rule-based extractor.
//!
//! Rules are tried in [`DuePattern::ORDERED`] order and the first structural
//! match wins. "month" here is a fixed 30 days, not a calendar month. A
//! match whose date lands past year 9999 is reported as invalid.

use chrono::NaiveDate;
use regex::{Captures, Regex};

use crate::dates::natural::{quantity, NUMBER_WORDS};
use crate::dates::{
    days_after, is_iso_representable, month_alternation, month_from_name, next_weekday,
    next_weekday_pattern, weekday_from_name,
};

/// Days per "month" in `next month`.
pub const APPROX_MONTH_DAYS: u64 = 30;

/// One due-date form the fallback extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuePattern {
    /// `next monday`.
    NextWeekday,
    /// `January 15, 2024`.
    MonthDayYear,
    /// `15 January 2024`.
    DayMonthYear,
    /// `2024-01-15`.
    IsoNumeric,
    /// `01/15/2024`.
    SlashNumeric,
    /// `next week`, `next month`.
    NextPeriod,
    /// `in 3 days`, `in two weeks`.
    InPeriod,
}

impl DuePattern {
    /// The table in evaluation order.
    pub const ORDERED: [DuePattern; 7] = [
        Self::NextWeekday,
        Self::MonthDayYear,
        Self::DayMonthYear,
        Self::IsoNumeric,
        Self::SlashNumeric,
        Self::NextPeriod,
        Self::InPeriod,
    ];

    fn pattern(self) -> String {
        let months = month_alternation();
        match self {
            Self::NextWeekday => next_weekday_pattern(),
            Self::MonthDayYear => format!(
                r"(?i)\b({months})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?,?\s+(\d{{4}})\b"
            ),
            Self::DayMonthYear => format!(
                r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?({months})\.?,?\s+(\d{{4}})\b"
            ),
            Self::IsoNumeric => r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b".to_owned(),
            Self::SlashNumeric => r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b".to_owned(),
            Self::NextPeriod => r"(?i)\bnext\s+(week|month)\b".to_owned(),
            Self::InPeriod => format!(r"(?i)\bin\s+(\d+|{NUMBER_WORDS})\s+(day|week)s?\b"),
        }
    }

    fn resolve(self, caps: &Captures<'_>, reference: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::NextWeekday => {
                let weekday = weekday_from_name(caps.get(1)?.as_str())?;
                Some(next_weekday(reference, weekday))
            }
            Self::MonthDayYear => {
                let month = month_from_name(caps.get(1)?.as_str())?;
                NaiveDate::from_ymd_opt(number(caps, 3)?, month, number(caps, 2)?)
            }
            Self::DayMonthYear => {
                let month = month_from_name(caps.get(2)?.as_str())?;
                NaiveDate::from_ymd_opt(number(caps, 3)?, month, number(caps, 1)?)
            }
            Self::IsoNumeric => {
                NaiveDate::from_ymd_opt(number(caps, 1)?, number(caps, 2)?, number(caps, 3)?)
            }
            Self::SlashNumeric => {
                let first: u32 = number(caps, 1)?;
                let second: u32 = number(caps, 2)?;
                let (month, day) = if first > 12 { (second, first) } else { (first, second) };
                NaiveDate::from_ymd_opt(number(caps, 3)?, month, day)
            }
            Self::NextPeriod => {
                let days = match caps.get(1)?.as_str().to_ascii_lowercase().as_str() {
                    "week" => 7,
                    _ => APPROX_MONTH_DAYS,
                };
                Some(days_after(reference, days))
            }
            Self::InPeriod => {
                let count = quantity(caps.get(1)?.as_str())?;
                let days = match caps.get(2)?.as_str().to_ascii_lowercase().as_str() {
                    "week" => count.checked_mul(7)?,
                    _ => count,
                };
                Some(days_after(reference, days))
            }
        }
    }
}

fn number<T: std::str::FromStr>(caps: &Captures<'_>, index: usize) -> Option<T> {
    caps.get(index)?.as_str().parse().ok()
}

/// Outcome of running the due-date table over a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueMatch {
    /// A rule matched and produced a date.
    Resolved(DuePattern, NaiveDate),
    /// A rule matched structurally but the date was not valid.
    Invalid(DuePattern),
    /// No rule matched.
    NoMatch,
}

/// Compiled due-date rule table.
#[derive(Debug, Clone)]
pub struct DueDateRules {
    table: Vec<(DuePattern, Regex)>,
}

impl Default for DueDateRules {
    fn default() -> Self {
        Self::new()
    }
}

impl DueDateRules {
    /// Compile every pattern in [`DuePattern::ORDERED`].
    pub fn new() -> Self {
        let table = DuePattern::ORDERED
            .iter()
            .filter_map(|p| Regex::new(&p.pattern()).ok().map(|re| (*p, re)))
            .collect();
        Self { table }
    }

    /// Run the table against `text`. The first structural match decides.
    pub fn find(&self, text: &str, reference: NaiveDate) -> DueMatch {
        for (pattern, re) in &self.table {
            if let Some(caps) = re.captures(text) {
                let resolved = pattern
                    .resolve(&caps, reference)
                    .filter(|date| is_iso_representable(*date));
                return match resolved {
                    Some(date) => DueMatch::Resolved(*pattern, date),
                    None => DueMatch::Invalid(*pattern),
                };
            }
        }
        DueMatch::NoMatch
    }
}
