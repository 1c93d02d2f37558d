//! Pause points and next-pause search.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::time::{format_time, parse_time_str, parse_time_value};

/// A timestamp in a video at which playback auto-pauses for discussion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PausePoint {
    /// Position in seconds (finite, non-negative).
    pub time: f64,
    /// Human-readable label.
    pub label: String,
}

impl PausePoint {
    /// Creates a pause point.
    pub fn new(time: f64, label: impl Into<String>) -> Self {
        Self {
            time,
            label: label.into(),
        }
    }
}

/// A pause point as it appears in a class document.
///
/// Documents mix plain numbers, clock strings and `{time, label}` objects.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawPausePoint {
    /// Seconds as a number.
    Seconds(f64),
    /// Clock or numeric string.
    Text(String),
    /// Object form with an optional label.
    Entry {
        #[serde(default)]
        time: Value,
        #[serde(default)]
        label: Option<String>,
    },
    /// Anything else; always dropped.
    Other(Value),
}

impl RawPausePoint {
    /// Coerces into a pause point, or `None` when the time is unusable.
    pub fn normalize(&self) -> Option<PausePoint> {
        let (time, label) = match self {
            RawPausePoint::Seconds(secs) => {
                ((secs.is_finite() && *secs >= 0.0).then_some(*secs)?, None)
            }
            RawPausePoint::Text(text) => (parse_time_str(text)?, None),
            RawPausePoint::Entry { time, label } => (parse_time_value(time)?, label.clone()),
            RawPausePoint::Other(_) => return None,
        };

        let label = label
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| format_time(time));
        Some(PausePoint { time, label })
    }
}

/// Normalizes raw pause points: drops unusable entries and sorts by time.
///
/// The sort is stable, so points sharing a timestamp keep document order.
pub fn normalize_pause_points(raw: &[RawPausePoint]) -> Vec<PausePoint> {
    let mut points: Vec<PausePoint> = raw.iter().filter_map(RawPausePoint::normalize).collect();
    points.sort_by(|a, b| a.time.total_cmp(&b.time));
    points
}

/// Serde adapter for fields holding a list of raw pause points.
pub(crate) fn deserialize_pause_points<'de, D>(deserializer: D) -> Result<Vec<PausePoint>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<RawPausePoint>> = Option::deserialize(deserializer)?;
    Ok(raw.map(|r| normalize_pause_points(&r)).unwrap_or_default())
}

/// Returns the index of the first pause point strictly after `position`.
///
/// `points` must be sorted ascending by time. `None` means there are no
/// more pauses ahead.
pub fn next_pause_after(points: &[PausePoint], position: f64) -> Option<usize> {
    let idx = points.partition_point(|p| p.time <= position);
    (idx < points.len()).then_some(idx)
}
