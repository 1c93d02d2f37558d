//! Maps outline sections to pause points.
//!
//! A section is matched textually first (substring, then token overlap
//! against each pause label) and only then by a timestamp written at the
//! start of its summary.

use std::collections::HashSet;
use std::sync::OnceLock;

use lectern_models::PausePoint;
use regex::Regex;
use serde::Serialize;

/// Maximum distance in seconds for a timestamp match.
pub const TIMESTAMP_TOLERANCE: f64 = 45.0;

/// Score given to substring matches.
pub const SUBSTRING_SCORE: usize = 2;

/// Why a section was mapped to a pause point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "by", rename_all = "camelCase")]
pub enum MatchReason {
    /// One normalized text contains the other.
    Substring,
    /// Shared words between summary and label.
    TokenOverlap { tokens: usize },
    /// Leading timestamp in the summary, `delta` seconds from the point.
    Timestamp { delta: f64 },
}

impl MatchReason {
    /// Textual score; timestamp matches score zero.
    pub fn score(&self) -> usize {
        match self {
            MatchReason::Substring => SUBSTRING_SCORE,
            MatchReason::TokenOverlap { tokens } => *tokens,
            MatchReason::Timestamp { .. } => 0,
        }
    }
}

/// A section mapped to a pause point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SectionMatch {
    pub index: usize,
    pub reason: MatchReason,
}

fn timestamp_marker() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\b\d{1,2}:\d{2}(?::\d{2})?\b").expect("valid timestamp marker regex")
    })
}

fn leading_timestamp() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{1,2}):(\d{2})(?::(\d{2}))?").expect("valid leading timestamp regex")
    })
}

/// Normalizes text for comparison.
///
/// Lowercases, drops timestamp markers, turns `·` and
/// `" ( ) [ ] { } : , . &` into spaces and collapses whitespace.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = timestamp_marker().replace_all(&lowered, " ");
    let spaced: String = stripped
        .chars()
        .map(|c| match c {
            '\u{00b7}' | '"' | '(' | ')' | '[' | ']' | '{' | '}' | ':' | ',' | '.' | '&' => ' ',
            c => c,
        })
        .collect();
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Number of distinct words two normalized strings share.
pub fn token_overlap(a: &str, b: &str) -> usize {
    let left: HashSet<&str> = a.split_whitespace().collect();
    if left.is_empty() {
        return 0;
    }
    let right: HashSet<&str> = b.split_whitespace().collect();
    left.intersection(&right).count()
}

/// Seconds from a timestamp at the start of `summary`.
///
/// Two parts read as `M:SS`, three as `H:MM:SS`.
pub fn parse_time_from_summary(summary: &str) -> Option<f64> {
    let caps = leading_timestamp().captures(summary.trim_start())?;
    let first: f64 = caps.get(1)?.as_str().parse().ok()?;
    let second: f64 = caps.get(2)?.as_str().parse().ok()?;
    match caps.get(3) {
        Some(third) => {
            let third: f64 = third.as_str().parse().ok()?;
            Some(first * 3600.0 + second * 60.0 + third)
        }
        None => Some(first * 60.0 + second),
    }
}

/// Finds the pause point a section summary refers to.
pub fn match_section(summary: &str, points: &[PausePoint]) -> Option<SectionMatch> {
    if points.is_empty() {
        return None;
    }

    let wanted = normalize(summary);
    if !wanted.is_empty() {
        let mut best: Option<(usize, usize)> = None;
        for (index, point) in points.iter().enumerate() {
            let label = normalize(&point.label);
            if label.is_empty() {
                continue;
            }
            if wanted.contains(&label) || label.contains(&wanted) {
                return Some(SectionMatch {
                    index,
                    reason: MatchReason::Substring,
                });
            }
            let tokens = token_overlap(&wanted, &label);
            if tokens > best.map_or(0, |(_, score)| score) {
                best = Some((index, tokens));
            }
        }
        if let Some((index, tokens)) = best {
            return Some(SectionMatch {
                index,
                reason: MatchReason::TokenOverlap { tokens },
            });
        }
    }

    let at = parse_time_from_summary(summary)?;
    let (index, delta) = points
        .iter()
        .enumerate()
        .map(|(i, p)| (i, (p.time - at).abs()))
        .fold(None, |best: Option<(usize, f64)>, (i, delta)| match best {
            Some((_, best_delta)) if best_delta <= delta => best,
            _ => Some((i, delta)),
        })?;

    (delta <= TIMESTAMP_TOLERANCE).then_some(SectionMatch {
        index,
        reason: MatchReason::Timestamp { delta },
    })
}
