//! Publication date parsing and recency filtering.
//!
//! Sources publish dates in many shapes:
//!
//! - machine-readable `datetime` attributes: `2025-11-03T15:30:00+0000`
//! - prefixed prose: `Published: May 12, 2023`, `Updated 10:32 AM EDT, Mon November 3, 2025`
//! - time-first prose: `5:30 PM ET Nov 3, 2025`
//!
//! [`parse_article_date`] strips the source's prefixes, tries the structured
//! formats, then falls back to splitting prose into a time, a US timezone
//! abbreviation and a date. Values without a zone are taken as UTC.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2}):(\d{2})(?::(\d{2}))?\s*([ap])\.?\s?m\.?(?:\s|$)|\b(\d{1,2}):(\d{2})(?::(\d{2}))?\b")
        .expect("time regex")
});

const CNN_PREFIXES: &[&str] = &["published:", "published", "updated:", "updated"];
const CNBC_PREFIXES: &[&str] = &[
    "first published:",
    "first published",
    "published:",
    "published",
    "updated:",
    "updated",
];
const DEFAULT_PREFIXES: &[&str] = &["published:", "updated:"];

const DATE_FORMATS: &[&str] = &["%B %d %Y", "%d %B %Y", "%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

const WEEKDAYS: &[&str] = &[
    "mon", "monday", "tue", "tues", "tuesday", "wed", "wednesday", "thu", "thur", "thurs",
    "thursday", "fri", "friday", "sat", "saturday", "sun", "sunday",
];

fn prefixes_for(source: &str) -> &'static [&'static str] {
    match source.to_ascii_lowercase().as_str() {
        "cnn" => CNN_PREFIXES,
        "cnbc" => CNBC_PREFIXES,
        _ => DEFAULT_PREFIXES,
    }
}

/// Offset in hours for the US zone abbreviations news sites print.
/// Bare `ET`/`CT`/... are read as standard time.
fn zone_offset(token: &str) -> Option<i32> {
    let hours = match token.to_ascii_uppercase().as_str() {
        "UTC" | "GMT" | "Z" => 0,
        "ET" | "EST" => -5,
        "EDT" => -4,
        "CT" | "CST" => -6,
        "CDT" => -5,
        "MT" | "MST" => -7,
        "MDT" => -6,
        "PT" | "PST" => -8,
        "PDT" => -7,
        _ => return None,
    };
    Some(hours)
}

/// Remove one leading source prefix, case-insensitively.
fn strip_prefix(raw: &str, source: &str) -> String {
    let trimmed = raw.trim();
    let lower = trimmed.to_lowercase();
    for prefix in prefixes_for(source) {
        if lower.starts_with(prefix) {
            // Prefixes are ASCII, so byte offsets line up with the original.
            return trimmed[prefix.len()..].trim_start_matches([':', ' ', ',']).trim().to_string();
        }
    }
    trimmed.to_string()
}

/// Parse a raw date string into UTC. Returns `None` on any failure.
pub fn parse_article_date(raw: Option<&str>, source: &str) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    let cleaned = strip_prefix(raw, source);
    let parsed = parse_structured(&cleaned).or_else(|| parse_prose(&cleaned));
    if parsed.is_none() {
        debug!(raw, source, "Unparsable publication date");
    }
    parsed
}

fn parse_structured(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    None
}

/// Split prose into time, zone and date parts and parse each.
fn parse_prose(s: &str) -> Option<DateTime<Utc>> {
    let mut rest = s.replace(',', " ");

    let mut time = NaiveTime::MIN;
    if let Some(caps) = TIME_RE.captures(&rest) {
        let (h, m, sec, meridiem) = if caps.get(1).is_some() {
            (caps.get(1), caps.get(2), caps.get(3), caps.get(4))
        } else {
            (caps.get(5), caps.get(6), caps.get(7), None)
        };
        let mut hour: u32 = h?.as_str().parse().ok()?;
        let minute: u32 = m?.as_str().parse().ok()?;
        let second: u32 = sec.map_or(Some(0), |s| s.as_str().parse().ok())?;
        if let Some(meridiem) = meridiem {
            if !(1..=12).contains(&hour) {
                return None;
            }
            let pm = meridiem.as_str().eq_ignore_ascii_case("p");
            hour = match (hour, pm) {
                (12, false) => 0,
                (12, true) => 12,
                (h, true) => h + 12,
                (h, false) => h,
            };
        }
        time = NaiveTime::from_hms_opt(hour, minute, second)?;
        let range = caps.get(0)?.range();
        rest.replace_range(range, " ");
    }

    let mut offset_hours = None;
    let mut date_tokens = Vec::new();
    for token in rest.split_whitespace() {
        let bare = token.trim_matches('.');
        let lower = bare.to_ascii_lowercase();
        if WEEKDAYS.contains(&lower.as_str()) || lower == "at" || lower == "on" {
            continue;
        }
        if let Some(hours) = zone_offset(bare) {
            offset_hours = Some(hours);
            continue;
        }
        date_tokens.push(bare);
    }
    let date_part = date_tokens.join(" ");
    let date = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(&date_part, format).ok())?;

    let naive = date.and_time(time);
    match offset_hours {
        None => Some(naive.and_utc()),
        Some(hours) => {
            let offset = FixedOffset::east_opt(hours * 3600)?;
            offset
                .from_local_datetime(&naive)
                .single()
                .map(|dt| dt.with_timezone(&Utc))
        }
    }
}

/// `true` iff `now - ts <= hours`. `None` is never within the window; a
/// window too wide to represent admits every date.
pub fn is_within_window(ts: Option<DateTime<Utc>>, hours: i64) -> bool {
    is_within_window_at(ts, hours, Utc::now())
}

pub fn is_within_window_at(ts: Option<DateTime<Utc>>, hours: i64, now: DateTime<Utc>) -> bool {
    match ts {
        Some(ts) => Duration::try_hours(hours).is_none_or(|window| now - ts <= window),
        None => false,
    }
}

/// `YYYY-MM-DD HH:MM:SS` in UTC.
pub fn format_output_date(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}
