//! Relative and natural-language date resolution.
//!
//! [`DateResolver`] turns phrases like "next Monday", "in a week" or
//! "by January 15, 2023" into an absolute [`NaiveDate`] relative to an
//! explicit reference date. Nothing here reads the wall clock.
//!
//! Resolution order, first hit wins:
//! 1. `next <weekday>`: always lands in a following week, never today
//! 2. `in a week`: exactly seven days after the reference
//! 3. [`NaturalDateParser`]: general, future-preferring parsing

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use regex::Regex;

pub mod natural;

pub use natural::NaturalDateParser;

/// Days added when no usable date is found.
pub const DEFAULT_DUE_DAYS: u64 = 7;

/// Last year that still formats as a four-digit `YYYY-MM-DD` date.
pub const MAX_ISO_YEAR: i32 = 9999;

const WEEKDAY_ALTERNATION: &str = "monday|tuesday|wednesday|thursday|friday|saturday|sunday";

/// Resolves date phrases against a reference date.
#[derive(Debug, Clone)]
pub struct DateResolver {
    next_weekday: Option<Regex>,
    in_a_week: Option<Regex>,
    natural: NaturalDateParser,
}

impl Default for DateResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DateResolver {
    /// Build a resolver with its pattern tables compiled.
    pub fn new() -> Self {
        Self {
            next_weekday: Regex::new(&next_weekday_pattern()).ok(),
            in_a_week: Regex::new(r"(?i)\bin\s+a\s+week\b").ok(),
            natural: NaturalDateParser::new(),
        }
    }

    /// Resolve `text` to an absolute date, or `None` if nothing matched.
    ///
    /// Dates past [`MAX_ISO_YEAR`] count as unresolved.
    pub fn resolve(&self, text: &str, reference: NaiveDate) -> Option<NaiveDate> {
        if let Some(date) = self.resolve_next_weekday(text, reference) {
            return Some(date);
        }
        if self.in_a_week.as_ref().is_some_and(|re| re.is_match(text)) {
            return Some(week_after(reference)).filter(|date| is_iso_representable(*date));
        }
        self.natural.parse(text, reference)
    }

    /// Resolve only the `next <weekday>` rule.
    pub fn resolve_next_weekday(&self, text: &str, reference: NaiveDate) -> Option<NaiveDate> {
        let captures = self.next_weekday.as_ref()?.captures(text)?;
        let weekday = weekday_from_name(captures.get(1)?.as_str())?;
        Some(next_weekday(reference, weekday)).filter(|date| is_iso_representable(*date))
    }
}

/// Pattern for `next <weekday>`, capturing the weekday name.
pub(crate) fn next_weekday_pattern() -> String {
    format!(r"(?i)\bnext\s+({WEEKDAY_ALTERNATION})\b")
}

/// Alternation of full weekday names for embedding in other patterns.
pub(crate) fn weekday_alternation() -> &'static str {
    WEEKDAY_ALTERNATION
}

/// The next `target` strictly after `reference`.
///
/// When `target` is today or already passed this week, the result is in the
/// following week: "next Monday" asked on a Monday is seven days out.
pub fn next_weekday(reference: NaiveDate, target: Weekday) -> NaiveDate {
    let days_ahead = days_until(reference.weekday(), target);
    let days_ahead = if days_ahead == 0 { 7 } else { days_ahead };
    days_after(reference, u64::from(days_ahead))
}

/// The next `target` on or after `reference` (today counts).
pub fn upcoming_weekday(reference: NaiveDate, target: Weekday) -> NaiveDate {
    days_after(reference, u64::from(days_until(reference.weekday(), target)))
}

fn days_until(from: Weekday, to: Weekday) -> u32 {
    to.num_days_from_monday()
        .saturating_add(7)
        .saturating_sub(from.num_days_from_monday())
        .checked_rem(7)
        .unwrap_or(0)
}

/// `reference` plus `days`, saturating at [`NaiveDate::MAX`].
pub fn days_after(reference: NaiveDate, days: u64) -> NaiveDate {
    reference
        .checked_add_days(Days::new(days))
        .unwrap_or(NaiveDate::MAX)
}

/// `reference` plus calendar months, saturating at [`NaiveDate::MAX`].
///
/// Day-of-month clamps to the end of shorter months.
pub fn months_after(reference: NaiveDate, months: u32) -> NaiveDate {
    reference
        .checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}

/// Whether `date` formats as plain `YYYY-MM-DD` (no sign, four-digit year).
pub fn is_iso_representable(date: NaiveDate) -> bool {
    (0..=MAX_ISO_YEAR).contains(&date.year())
}

/// The default due date: one week after `reference`.
pub fn week_after(reference: NaiveDate) -> NaiveDate {
    days_after(reference, DEFAULT_DUE_DAYS)
}

/// Parse a full English weekday name (case-insensitive).
pub fn weekday_from_name(name: &str) -> Option<Weekday> {
    match name.trim().to_ascii_lowercase().as_str() {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Parse an English month name or its common abbreviation (case-insensitive).
pub fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.trim().trim_end_matches('.').to_ascii_lowercase();
    let month = match lower.as_str() {
        "jan" | "january" => 1,
        "feb" | "february" => 2,
        "mar" | "march" => 3,
        "apr" | "april" => 4,
        "may" => 5,
        "jun" | "june" => 6,
        "jul" | "july" => 7,
        "aug" | "august" => 8,
        "sep" | "sept" | "september" => 9,
        "oct" | "october" => 10,
        "nov" | "november" => 11,
        "dec" | "december" => 12,
        _ => return None,
    };
    Some(month)
}

/// Regex alternation matching every name [`month_from_name`] accepts.
pub(crate) fn month_alternation() -> &'static str {
    "january|february|march|april|may|june|july|august|september|october|november|december\
     |jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec"
}

/// Format a date as `YYYY-MM-DD`.
pub fn format_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
