//! Alert timestamp extraction
//!
//! Motion alerts carry their trigger time as free text, e.g.
//! `"C3WN(K49112334) motion detected 2023-08-30 22:41:06 ..."`. The time is
//! camera-local wall-clock time with second precision.

use super::AlertError;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use regex::Regex;
use std::sync::OnceLock;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn timestamp_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}").expect("valid timestamp regex")
    })
}

/// First `YYYY-MM-DD HH:MM:SS` substring of `text`, if any
pub fn extract_timestamp(text: &str) -> Option<&str> {
    timestamp_regex().find(text).map(|m| m.as_str())
}

/// Parse a `YYYY-MM-DD HH:MM:SS` string as local time
pub fn parse_timestamp(text: &str) -> Result<DateTime<Local>, AlertError> {
    let naive = NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .map_err(|e| AlertError::InvalidTimestamp(format!("{:?}: {}", text, e)))?;

    Local
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| AlertError::InvalidTimestamp(format!("{:?}: ambiguous local time", text)))
}

/// Extract and parse the alert time from a message body
pub fn timestamp_from_text(text: &str) -> Option<DateTime<Local>> {
    let raw = extract_timestamp(text)?;
    match parse_timestamp(raw) {
        Ok(ts) => Some(ts),
        Err(e) => {
            tracing::warn!("Skipping alert: {}", e);
            None
        }
    }
}
