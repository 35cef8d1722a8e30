// Utility helpers for header cleanup, number parsing and console formatting.
//
// Worksheets arrive with free-text headings and loosely typed cells; this
// module turns them into the snake_case names and typed values the rest of
// the pipeline assumes.
use chrono::NaiveDateTime;
use num_format::{Locale, ToFormattedString};
use std::collections::{HashMap, HashSet};

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in spreadsheet exports.
///
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters.
/// - Strips thousands separators like `","` before parsing.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok()
}

/// Render a numeric cell the way a human typed it: integral values lose
/// their trailing `.0`.
pub fn render_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Excel date cells become ISO dates, keeping the time only when present.
pub fn render_datetime(dt: NaiveDateTime) -> String {
    if dt.time() == chrono::NaiveTime::MIN {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Normalize one heading to snake_case.
///
/// Every run of characters that is not ASCII alphanumeric collapses into a
/// single `_`; leading and trailing underscores are dropped.
pub fn clean_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for c in raw.trim().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

/// Clean a full header row.
///
/// Blank headings become `unnamed_<index>`; the n-th repeat of a name gets
/// a `_<n>` suffix so every column stays addressable. A suffix that would
/// clash with a name already taken is skipped.
pub fn clean_headers<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut repeats: HashMap<String, usize> = HashMap::new();
    let mut taken: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(raw.len());
    for (idx, heading) in raw.iter().enumerate() {
        let mut name = clean_name(heading.as_ref());
        if name.is_empty() {
            name = format!("unnamed_{}", idx);
        }
        let count = repeats.entry(name.clone()).or_insert(0);
        let mut unique = name.clone();
        while taken.contains(&unique) {
            *count += 1;
            unique = format!("{}_{}", name, count);
        }
        taken.insert(unique.clone());
        out.push(unique);
    }
    out
}

/// Map a melted year column such as `2021_2022` to its report label
/// `2021/2022`. Anything else is not a financial-year column.
pub fn financial_year_label(column: &str) -> Option<String> {
    let (start, end) = column.split_once('_')?;
    let is_year = |s: &str| s.len() == 4 && s.chars().all(|c| c.is_ascii_digit());
    if is_year(start) && is_year(end) {
        Some(format!("{}/{}", start, end))
    } else {
        None
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for counts in log lines
    // (e.g., `9,855 fact records`).
    n.to_formatted_string(&Locale::en)
}
