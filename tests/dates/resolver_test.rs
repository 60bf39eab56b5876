//! Date resolution against an explicit reference date.

use chrono::{Datelike, NaiveDate, Weekday};
use taskdraft::dates::{format_iso, next_weekday, DateResolver, NaturalDateParser};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(y, m, d) {
        Some(date) => date,
        None => panic!("{y}-{m}-{d} should be a valid date"),
    }
}

/// 2024-01-01 is a Monday.
fn monday() -> NaiveDate {
    date(2024, 1, 1)
}

#[test]
fn next_monday_on_a_monday_is_seven_days_out() {
    let resolver = DateResolver::new();
    assert_eq!(resolver.resolve("next Monday", monday()), Some(date(2024, 1, 8)));
}

#[test]
fn next_weekday_later_this_week() {
    let resolver = DateResolver::new();
    assert_eq!(resolver.resolve("next friday", monday()), Some(date(2024, 1, 5)));
}

#[test]
fn next_weekday_already_passed_wraps_to_following_week() {
    let resolver = DateResolver::new();
    // Thursday reference; Tuesday already passed.
    assert_eq!(
        resolver.resolve("NEXT TUESDAY", date(2024, 1, 4)),
        Some(date(2024, 1, 9))
    );
}

#[test]
fn next_weekday_is_never_today_or_earlier() {
    let reference = date(2024, 2, 28);
    for target in [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ] {
        let resolved = next_weekday(reference, target);
        assert!(resolved > reference, "{target} resolved to {resolved}");
        assert_eq!(resolved.weekday(), target);
        assert!(resolved <= date(2024, 3, 6));
    }
}

#[test]
fn in_a_week_is_exactly_seven_days() {
    let resolver = DateResolver::new();
    assert_eq!(resolver.resolve("in a week", monday()), Some(date(2024, 1, 8)));
    assert_eq!(
        resolver.resolve("finish it In A Week please", date(2024, 12, 28)),
        Some(date(2025, 1, 4))
    );
}

#[test]
fn explicit_dates_use_natural_parser() {
    let resolver = DateResolver::new();
    assert_eq!(
        resolver.resolve("by January 15, 2023", monday()),
        Some(date(2023, 1, 15))
    );
    assert_eq!(resolver.resolve("in 5 days", monday()), Some(date(2024, 1, 6)));
    assert_eq!(resolver.resolve("2024-03-09", monday()), Some(date(2024, 3, 9)));
}

#[test]
fn bare_weekday_prefers_the_coming_one() {
    let resolver = DateResolver::new();
    assert_eq!(resolver.resolve("by Wednesday", monday()), Some(date(2024, 1, 3)));
    assert_eq!(resolver.resolve("monday", monday()), Some(monday()));
}

#[test]
fn unresolvable_phrase_is_none() {
    let resolver = DateResolver::new();
    assert_eq!(resolver.resolve("whenever you get to it", monday()), None);
    assert_eq!(resolver.resolve("", monday()), None);
}

#[test]
fn dates_past_year_9999_are_none() {
    let resolver = DateResolver::new();
    assert_eq!(resolver.resolve("in 3000000 days", monday()), None);
    assert_eq!(resolver.resolve("in 100000 years", monday()), None);
    assert_eq!(resolver.resolve("next friday", date(9999, 12, 31)), None);
    assert_eq!(resolver.resolve("December 31, 9999", monday()), Some(date(9999, 12, 31)));
}

#[test]
fn modal_may_is_not_a_month() {
    let resolver = DateResolver::new();
    assert_eq!(resolver.resolve("You may 2 hours", monday()), None);
    assert_eq!(resolver.resolve("May 2", monday()), Some(date(2024, 5, 2)));
    assert_eq!(resolver.resolve("may 2nd", monday()), Some(date(2024, 5, 2)));
}

#[test]
fn natural_parser_rolls_missing_year_forward() {
    let parser = NaturalDateParser::new();
    assert_eq!(
        parser.parse("15 March", date(2024, 6, 1)),
        Some(date(2025, 3, 15))
    );
    assert_eq!(parser.parse("tomorrow", date(2024, 2, 29)), Some(date(2024, 3, 1)));
}

#[test]
fn month_arithmetic_clamps_to_month_end() {
    let parser = NaturalDateParser::new();
    assert_eq!(
        parser.parse("next month", date(2024, 1, 31)),
        Some(date(2024, 2, 29))
    );
}

#[test]
fn iso_formatting() {
    assert_eq!(format_iso(date(2024, 1, 8)), "2024-01-08");
}
