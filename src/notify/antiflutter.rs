// src/notify/antiflutter.rs
use std::collections::HashSet;

use crate::launch::{LaunchKey, LaunchTime};

/// Keep fired entries this long after liftoff before forgetting them.
const RETAIN_AFTER_LIFTOFF_SECS: i64 = 24 * 3600;

/// Duplicate-fire guard: each (launch, threshold) pair notifies at most once.
/// - First alert for a pair always allowed.
/// - Repeats for the same pair are suppressed, even if the loop wakes twice
///   for the same instant.
/// - State is updated explicitly via `record` after presenting.
#[derive(Debug, Clone, Default)]
pub struct FiredLedger {
    fired: HashSet<(LaunchKey, i64)>,
}

impl FiredLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if `threshold` may still fire for `launch`. Does NOT mutate state.
    pub fn should_fire(&self, launch: &LaunchKey, threshold: i64) -> bool {
        !self.fired.contains(&(launch.clone(), threshold))
    }

    /// Record that `threshold` was presented for `launch`.
    pub fn record(&mut self, launch: LaunchKey, threshold: i64) {
        self.fired.insert((launch, threshold));
    }

    /// Drop entries for launches that lifted off more than a day before `now`.
    pub fn prune(&mut self, now: i64) {
        self.fired.retain(|(k, _)| match k.launch_time {
            LaunchTime::At(t) => t.saturating_add(RETAIN_AFTER_LIFTOFF_SECS) >= now,
            LaunchTime::Unknown => false,
        });
    }

    pub fn len(&self) -> usize {
        self.fired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
    }
}
