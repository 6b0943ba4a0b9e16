// src/locale.rs

//! German calendar names used by the listing and the rendered output.

use chrono::{Datelike, NaiveDate, Weekday};

const MONTHS: [&str; 12] = [
    "Januar",
    "Februar",
    "März",
    "April",
    "Mai",
    "Juni",
    "Juli",
    "August",
    "September",
    "Oktober",
    "November",
    "Dezember",
];

/// Look up a month number (1-12) from its German name.
///
/// Matching is case-insensitive and accepts the `Maerz` spelling.
pub fn month_from_name(name: &str) -> Option<u32> {
    let needle = name.trim().to_lowercase();
    if needle == "maerz" {
        return Some(3);
    }
    MONTHS
        .iter()
        .position(|m| m.to_lowercase() == needle)
        .map(|idx| idx as u32 + 1)
}

/// German name for a month number (1-12).
pub fn month_name(month: u32) -> Option<&'static str> {
    MONTHS.get(month.checked_sub(1)? as usize).copied()
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Montag",
        Weekday::Tue => "Dienstag",
        Weekday::Wed => "Mittwoch",
        Weekday::Thu => "Donnerstag",
        Weekday::Fri => "Freitag",
        Weekday::Sat => "Samstag",
        Weekday::Sun => "Sonntag",
    }
}

/// Format a date as "Montag, 15. Januar 2024".
pub fn format_long_date(date: NaiveDate) -> String {
    format!(
        "{}, {:02}. {} {}",
        weekday_name(date.weekday()),
        date.day(),
        month_name(date.month()).unwrap_or_default(),
        date.year()
    )
}
