//! Date normalization for loosely formatted extract dates.
//!
//! Extracts mix ISO dates, US `MM/DD/YYYY`, European `DD/MM/YYYY` and the
//! occasional month-name form. Everything is brought to `YYYY-MM-DD`.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

const CANONICAL: &str = "%Y-%m-%d";

const DIRECT_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y%m%d",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
    "%d-%b-%Y",
];

const DIRECT_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse a date string in any of the supported layouts.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    parse_direct(trimmed).or_else(|| parse_by_parts(trimmed))
}

/// Canonicalize `input` to `YYYY-MM-DD`, or return it unchanged if no
/// layout matches.
pub fn normalize_date(input: &str) -> String {
    match parse_date(input) {
        Some(date) => date.format(CANONICAL).to_string(),
        None => input.to_string(),
    }
}

/// Years below this come from `%Y` swallowing a day or month field.
const MIN_DIRECT_YEAR: i32 = 1000;

fn parse_direct(s: &str) -> Option<NaiveDate> {
    parse_direct_any(s).filter(|d| d.year() >= MIN_DIRECT_YEAR)
}

fn parse_direct_any(s: &str) -> Option<NaiveDate> {
    for fmt in DIRECT_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }
    for fmt in DIRECT_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// Split on `/` or `-` and try month-first, then day-first.
fn parse_by_parts(s: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = s.split(['/', '-']).map(str::trim).collect();
    if parts.len() != 3 {
        return None;
    }
    let nums: Vec<u32> = parts
        .iter()
        .map(|p| p.parse::<u32>().ok())
        .collect::<Option<Vec<_>>>()?;
    let year = expand_year(nums[2], parts[2].len())?;

    NaiveDate::from_ymd_opt(year, nums[0], nums[1])
        .or_else(|| NaiveDate::from_ymd_opt(year, nums[1], nums[0]))
}

fn expand_year(value: u32, digits: usize) -> Option<i32> {
    match digits {
        2 => Some(2000 + value as i32),
        4 => Some(value as i32),
        _ => None,
    }
}
