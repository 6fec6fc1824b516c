//! Time-token parsing for flight times.
//!
//! Flight times arrive from the backend as free-form strings: bare clock
//! times (`"08:05"`), ISO-8601 date-times, or display strings that cannot be
//! parsed at all. This module resolves them to a wall-clock time where
//! possible and produces a normalized token for key matching.
//!
//! # Time Model
//! Resolved times are wall-clock minutes of the day (0..1440). The dashboard
//! plans a single day, so the date portion of a date-time is dropped.
//! Runs crossing midnight are not compared across the boundary.

use chrono::{DateTime, NaiveDateTime, NaiveTime, Timelike};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S", "%H:%M:%S%.f", "%H%M"];

/// Parses a flight time string into a wall-clock time.
///
/// Accepts RFC 3339 (wall time at the given offset), naive ISO-8601
/// date-times, `YYYY-MM-DD HH:MM[:SS]`, `HH:MM[:SS]` and `HHMM`.
/// Returns `None` for empty or unparsable input.
///
/// # Examples
///
/// ```
/// use u_runboard::models::time::parse_time;
///
/// assert!(parse_time("08:10").is_some());
/// assert!(parse_time("2026-10-18T08:10:00+11:00").is_some());
/// assert!(parse_time("TBA").is_none());
/// ```
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local().time());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.time());
        }
    }

    for fmt in TIME_FORMATS {
        if let Ok(t) = NaiveTime::parse_from_str(s, fmt) {
            return Some(t);
        }
    }

    None
}

/// Minutes since midnight.
#[inline]
pub fn minute_of_day(t: NaiveTime) -> i64 {
    i64::from(t.hour()) * 60 + i64::from(t.minute())
}

/// Minutes since midnight for a parsable time string.
pub fn minutes_of_day(raw: &str) -> Option<i64> {
    parse_time(raw).map(minute_of_day)
}

/// Normalizes a time string into a matching token.
///
/// Parsable times become `HH:MM`; anything else is trimmed and upper-cased
/// so that display strings still compare consistently. Empty input yields
/// `None`.
pub fn normalize_time_token(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    match parse_time(s) {
        Some(t) => Some(t.format("%H:%M").to_string()),
        None => Some(s.to_uppercase()),
    }
}

/// Normalizes a flight number for key matching (`"jq 402"` → `"JQ402"`).
pub fn normalize_flight_number(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Builds the composite `"NUMBER|HH:MM"` key used by overlay matching.
pub fn composite_key(flight_number: &str, time_token: &str) -> String {
    format!("{}|{}", normalize_flight_number(flight_number), time_token)
}
