//! General natural-language date parsing.
//!
//! An ordered table of `(rule, pattern)` pairs. The first pattern that
//! matches decides the result; a structural match that is not a real
//! calendar date (e.g. "February 30, 2024") yields `None` rather than
//! falling through to a looser rule.
//!
//! Ambiguous phrases prefer the future: "March 3" asked in April means
//! next year's March 3, and a bare weekday means the coming one.
//!
//! Lowercase "may" is usually the modal verb, so it only names the month
//! when a year or an ordinal day goes with it ("may 3rd", "may 3, 2025").

use chrono::{Datelike, NaiveDate};
use regex::{Captures, Regex};

use super::{
    days_after, is_iso_representable, month_alternation, month_from_name, months_after,
    upcoming_weekday, weekday_alternation, weekday_from_name,
};

/// Spelled-out quantities accepted wherever a count is expected.
pub(crate) const NUMBER_WORDS: &str =
    "a|an|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve";

/// One entry in the natural-language rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaturalRule {
    /// `2024-01-15`, optionally followed by a time.
    IsoDate,
    /// `2024/01/15`.
    YearFirstSlash,
    /// `01/15/2024` (month first unless the first number exceeds 12).
    SlashDate,
    /// `January 15[, 2024]`.
    MonthDay,
    /// `15 January[ 2024]`.
    DayMonth,
    /// `today`, `tonight`, `eod`.
    Today,
    /// `day after tomorrow`.
    DayAfterTomorrow,
    /// `tomorrow`.
    Tomorrow,
    /// `in 3 days`, `in two weeks`, `in a month`.
    InQuantity,
    /// `3 days from now`.
    QuantityFromNow,
    /// `next week|month|year`.
    NextPeriod,
    /// `end of (the) week|month`.
    EndOfPeriod,
    /// `friday`, `by friday`, `this friday`.
    Weekday,
}

impl NaturalRule {
    /// The rule table in evaluation order.
    pub const ORDERED: [NaturalRule; 13] = [
        Self::IsoDate,
        Self::YearFirstSlash,
        Self::SlashDate,
        Self::MonthDay,
        Self::DayMonth,
        Self::Today,
        Self::DayAfterTomorrow,
        Self::Tomorrow,
        Self::InQuantity,
        Self::QuantityFromNow,
        Self::NextPeriod,
        Self::EndOfPeriod,
        Self::Weekday,
    ];

    fn pattern(self) -> String {
        let months = month_alternation();
        let weekdays = weekday_alternation();
        match self {
            Self::IsoDate => r"\b(\d{4})-(\d{1,2})-(\d{1,2})(?:[^\d]|$)".to_owned(),
            Self::YearFirstSlash => r"\b(\d{4})/(\d{1,2})/(\d{1,2})\b".to_owned(),
            Self::SlashDate => r"\b(\d{1,2})/(\d{1,2})/(\d{4}|\d{2})\b".to_owned(),
            Self::MonthDay => format!(
                r"(?i)\b({months})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s+(\d{{4}})\b)?"
            ),
            Self::DayMonth => format!(
                r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?({months})\b\.?(?:,?\s+(\d{{4}})\b)?"
            ),
            Self::Today => r"(?i)\b(?:today|tonight|eod)\b".to_owned(),
            Self::DayAfterTomorrow => r"(?i)\bday\s+after\s+tomorrow\b".to_owned(),
            Self::Tomorrow => r"(?i)\btomorrow\b".to_owned(),
            Self::InQuantity => {
                format!(r"(?i)\bin\s+(\d+|{NUMBER_WORDS})\s+(day|week|month|year)s?\b")
            }
            Self::QuantityFromNow => format!(
                r"(?i)\b(\d+|{NUMBER_WORDS})\s+(day|week|month|year)s?\s+from\s+(?:now|today)\b"
            ),
            Self::NextPeriod => r"(?i)\bnext\s+(week|month|year)\b".to_owned(),
            Self::EndOfPeriod => r"(?i)\bend\s+of\s+(?:the\s+)?(week|month)\b".to_owned(),
            Self::Weekday => {
                format!(r"(?i)\b(?:(?:this|on|by|until|before)\s+)?({weekdays})\b")
            }
        }
    }

    fn resolve(self, caps: &Captures<'_>, reference: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::IsoDate | Self::YearFirstSlash => {
                let year = capture_i32(caps, 1)?;
                NaiveDate::from_ymd_opt(year, capture_u32(caps, 2)?, capture_u32(caps, 3)?)
            }
            Self::SlashDate => {
                let first = capture_u32(caps, 1)?;
                let second = capture_u32(caps, 2)?;
                let year = expand_year(caps.get(3)?.as_str())?;
                let (month, day) = if first > 12 { (second, first) } else { (first, second) };
                NaiveDate::from_ymd_opt(year, month, day)
            }
            Self::MonthDay => {
                let month = month_from_name(caps.get(1)?.as_str())?;
                let day = capture_u32(caps, 2)?;
                month_day(reference, month, day, caps.get(3).map(|m| m.as_str()))
            }
            Self::DayMonth => {
                let day = capture_u32(caps, 1)?;
                let month = month_from_name(caps.get(2)?.as_str())?;
                month_day(reference, month, day, caps.get(3).map(|m| m.as_str()))
            }
            Self::Today => Some(reference),
            Self::DayAfterTomorrow => Some(days_after(reference, 2)),
            Self::Tomorrow => Some(days_after(reference, 1)),
            Self::InQuantity | Self::QuantityFromNow => {
                let count = quantity(caps.get(1)?.as_str())?;
                shift(reference, count, caps.get(2)?.as_str())
            }
            Self::NextPeriod => shift(reference, 1, caps.get(1)?.as_str()),
            Self::EndOfPeriod => match caps.get(1)?.as_str().to_ascii_lowercase().as_str() {
                "week" => Some(upcoming_weekday(reference, chrono::Weekday::Sun)),
                _ => last_day_of_month(reference),
            },
            Self::Weekday => {
                let weekday = weekday_from_name(caps.get(1)?.as_str())?;
                Some(upcoming_weekday(reference, weekday))
            }
        }
    }
}

/// Future-preferring general date parser.
#[derive(Debug, Clone)]
pub struct NaturalDateParser {
    rules: Vec<(NaturalRule, Regex)>,
    ordinal: Option<Regex>,
}

impl Default for NaturalDateParser {
    fn default() -> Self {
        Self::new()
    }
}

impl NaturalDateParser {
    /// Compile the rule table.
    pub fn new() -> Self {
        let rules = NaturalRule::ORDERED
            .iter()
            .filter_map(|rule| Regex::new(&rule.pattern()).ok().map(|re| (*rule, re)))
            .collect();
        Self {
            rules,
            ordinal: Regex::new(r"(?i)\d(?:st|nd|rd|th)\b").ok(),
        }
    }

    /// Parse `text` relative to `reference`. Years past
    /// [`MAX_ISO_YEAR`](super::MAX_ISO_YEAR) count as no date.
    pub fn parse(&self, text: &str, reference: NaiveDate) -> Option<NaiveDate> {
        let (rule, caps) = self.first_match(text)?;
        rule.resolve(&caps, reference).filter(|date| is_iso_representable(*date))
    }

    /// The first rule whose pattern matches `text`, if any.
    pub fn matching_rule(&self, text: &str) -> Option<NaturalRule> {
        self.first_match(text).map(|(rule, _)| rule)
    }

    fn first_match<'t>(&self, text: &'t str) -> Option<(NaturalRule, Captures<'t>)> {
        self.rules.iter().find_map(|(rule, re)| {
            re.captures_iter(text)
                .find(|caps| self.names_a_month(*rule, caps))
                .map(|caps| (*rule, caps))
        })
    }

    /// False for a lowercase "may" with neither a year nor an ordinal day.
    fn names_a_month(&self, rule: NaturalRule, caps: &Captures<'_>) -> bool {
        let month_group = match rule {
            NaturalRule::MonthDay => 1,
            NaturalRule::DayMonth => 2,
            _ => return true,
        };
        let Some(month) = caps.get(month_group) else {
            return true;
        };
        if !month.as_str().eq_ignore_ascii_case("may") || month.as_str().starts_with('M') {
            return true;
        }
        let ordinal = caps.get(0).is_some_and(|whole| {
            self.ordinal
                .as_ref()
                .is_some_and(|re| re.is_match(whole.as_str()))
        });
        caps.get(3).is_some() || ordinal
    }
}

fn capture_u32(caps: &Captures<'_>, index: usize) -> Option<u32> {
    caps.get(index)?.as_str().parse().ok()
}

fn capture_i32(caps: &Captures<'_>, index: usize) -> Option<i32> {
    caps.get(index)?.as_str().parse().ok()
}

fn expand_year(raw: &str) -> Option<i32> {
    let year: i32 = raw.parse().ok()?;
    if raw.len() == 2 {
        year.checked_add(2000)
    } else {
        Some(year)
    }
}

/// Build a month/day date, choosing the next occurrence when no year is given.
fn month_day(reference: NaiveDate, month: u32, day: u32, year: Option<&str>) -> Option<NaiveDate> {
    if let Some(year) = year {
        return NaiveDate::from_ymd_opt(year.parse().ok()?, month, day);
    }
    let this_year = NaiveDate::from_ymd_opt(reference.year(), month, day);
    match this_year {
        Some(date) if date >= reference => Some(date),
        _ => NaiveDate::from_ymd_opt(reference.year().checked_add(1)?, month, day),
    }
}

/// A digit string or one of [`NUMBER_WORDS`] as a count.
pub(crate) fn quantity(raw: &str) -> Option<u64> {
    let value = match raw.to_ascii_lowercase().as_str() {
        "a" | "an" | "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        digits => return digits.parse().ok(),
    };
    Some(value)
}

/// Move `reference` forward by `count` units. Months and years are calendar-aware.
fn shift(reference: NaiveDate, count: u64, unit: &str) -> Option<NaiveDate> {
    match unit.to_ascii_lowercase().as_str() {
        "day" => Some(days_after(reference, count)),
        "week" => Some(days_after(reference, count.checked_mul(7)?)),
        "month" => Some(months_after(reference, u32::try_from(count).ok()?)),
        "year" => Some(months_after(
            reference,
            u32::try_from(count.checked_mul(12)?).ok()?,
        )),
        _ => None,
    }
}

fn last_day_of_month(reference: NaiveDate) -> Option<NaiveDate> {
    let first = reference.with_day(1)?;
    months_after(first, 1).pred_opt()
}
