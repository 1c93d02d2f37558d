//! Time value parsing and formatting.
//!
//! Class documents express times as plain seconds (`45`, `"45"`) or as
//! clock strings (`"1:30"`, `"01:05:00"`). Everything downstream works in
//! seconds as `f64`.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

fn clock_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:(\d+):)?(\d+):(\d+(?:\.\d+)?)$").expect("valid clock regex")
    })
}

/// Parses a time string into seconds.
///
/// Accepts `M:SS`, `MM:SS`, `H:MM:SS` and plain numeric strings. Seconds
/// (and minutes when hours are present) must be below 60. Returns `None`
/// for anything that is not a non-negative finite number of seconds.
pub fn parse_time_str(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(caps) = clock_pattern().captures(trimmed) {
        let hours: f64 = match caps.get(1) {
            Some(h) => h.as_str().parse().ok()?,
            None => 0.0,
        };
        let minutes: f64 = caps[2].parse().ok()?;
        let seconds: f64 = caps[3].parse().ok()?;

        if seconds >= 60.0 || (caps.get(1).is_some() && minutes >= 60.0) {
            return None;
        }
        return Some(hours * 3600.0 + minutes * 60.0 + seconds);
    }

    let value: f64 = trimmed.parse().ok()?;
    valid_seconds(value)
}

/// Coerces a JSON value (number or string) into seconds.
pub fn parse_time_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().and_then(valid_seconds),
        Value::String(s) => parse_time_str(s),
        _ => None,
    }
}

fn valid_seconds(value: f64) -> Option<f64> {
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// Formats seconds as `M:SS` (minutes are not wrapped into hours).
pub fn format_time(total_seconds: f64) -> String {
    let total = total_seconds.max(0.0).floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
