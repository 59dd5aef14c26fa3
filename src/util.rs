// Utility helpers for parsing and display formatting.
//
// This module centralizes the forgiving CSV field handling so the loader can
// assume clean, typed values, and the number formatting used by the console
// and the narrative text.
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};

/// Date layouts seen in WHO exports across releases.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y"];

/// Parse a cumulative count, tolerating thousands separators and a trailing
/// `.0` left behind by spreadsheet exports.
///
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters or a sign.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_count_safe(s: Option<&str>) -> Option<u64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic() || c == '-' || c == '+') {
        return None;
    }
    let s = s.replace(',', "");
    if let Ok(v) = s.parse::<u64>() {
        return Some(v);
    }
    // `12.0` is fine, `12.5` is not a count.
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f >= 0.0 {
        Some(f as u64)
    } else {
        None
    }
}

pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    // Some exports carry a time part (`2020-01-03T00:00:00Z`); only the day matters.
    let day = s.split(['T', ' ']).next().unwrap_or(s);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(day, fmt).ok())
}

pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

pub fn average(v: &[f64]) -> f64 {
    // Standard arithmetic mean; returns 0 for an empty slice to avoid NaNs.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - locale-aware thousands separators (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: u64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// Whole-number display of a model estimate, truncated toward zero.
pub fn format_estimate(v: f64) -> String {
    format_int(v.trunc() as i64)
}

/// `07 April 2023`
pub fn format_long_date(d: NaiveDate) -> String {
    d.format("%d %B %Y").to_string()
}

/// File-name friendly form of a country name.
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('_');
            last_dash = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    if out.is_empty() {
        "unknown".to_string()
    } else {
        out
    }
}
