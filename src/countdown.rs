//! # Countdown
//! Notification thresholds (T-2 days down to liftoff) and the human-readable
//! countdown strings used in notification bodies.

use chrono::{Local, TimeZone};

/// A remaining-time boundary that triggers a notification when crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Threshold {
    pub secs_before: i64,
    pub label: &'static str,
}

/// Ascending by `secs_before`.
pub const THRESHOLDS: [Threshold; 7] = [
    Threshold { secs_before: 0, label: "Liftoff!" },
    Threshold { secs_before: 60, label: "T-1 minute." },
    Threshold { secs_before: 15 * 60, label: "T-15 minutes." },
    Threshold { secs_before: 3600, label: "T-1 hour." },
    Threshold { secs_before: 6 * 3600, label: "T-6 hours." },
    Threshold { secs_before: 24 * 3600, label: "T-1 day." },
    Threshold { secs_before: 2 * 24 * 3600, label: "T-2 days." },
];

/// Largest threshold strictly below `remaining` seconds, i.e. the next one
/// that will be reached. `None` once liftoff has been reached.
pub fn next_threshold(remaining: i64) -> Option<Threshold> {
    THRESHOLDS
        .iter()
        .rev()
        .find(|t| t.secs_before < remaining)
        .copied()
}

/// Label for an exact threshold value, falling back to raw formatting.
pub fn label_for(secs_before: i64) -> String {
    THRESHOLDS
        .iter()
        .find(|t| t.secs_before == secs_before)
        .map(|t| t.label.to_string())
        .unwrap_or_else(|| beautify_seconds(secs_before))
}

/// Countdown text for `s` seconds relative to liftoff (positive = still to
/// come, negative = already passed): `T-45 seconds.`, `T+1 hour.`, ...
pub fn beautify_seconds(s: i64) -> String {
    if s == 0 {
        return "Liftoff!".to_string();
    }
    let sign = if s > 0 { '-' } else { '+' };
    let a = s.unsigned_abs();
    let (n, unit) = if a <= 60 {
        (a, "second")
    } else if a <= 3600 {
        (a / 60, "minute")
    } else if a <= 2 * 86400 {
        (a / 3600, "hour")
    } else {
        (a / 86400, "day")
    };
    let plural = if n == 1 { "" } else { "s" };
    format!("T{sign}{n} {unit}{plural}.")
}

/// `YYYY-MM-DD HH:MM:SS` in the local timezone.
pub fn format_local_time(unix: i64) -> String {
    match Local.timestamp_opt(unix, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "unknown time".to_string(),
    }
}
