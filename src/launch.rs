//! # Launch model
//! Shared data shapes: the per-source `LaunchRecord` produced by site
//! adapters and the reconciled `CanonicalLaunch` consumed by the scheduler.
//!
//! Launch times are an explicit sum type. `LaunchTime::Unknown` orders after
//! every known instant, so sorting by time naturally pushes undated launches
//! to the back, but every consumer still has to match on it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Liftoff instant as unix seconds, or unknown/indefinite (NET dates,
/// month-only estimates, parse failures).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "unix")]
pub enum LaunchTime {
    At(i64),
    Unknown,
}

impl LaunchTime {
    pub fn known(self) -> Option<i64> {
        match self {
            LaunchTime::At(t) => Some(t),
            LaunchTime::Unknown => None,
        }
    }

    pub fn is_known(self) -> bool {
        matches!(self, LaunchTime::At(_))
    }
}

impl fmt::Display for LaunchTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchTime::At(t) => write!(f, "{t}"),
            LaunchTime::Unknown => f.write_str("unknown"),
        }
    }
}

/// One source's raw report of an upcoming launch for one polling cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchRecord {
    pub source: String, // adapter id, e.g. "rocketlaunch.live"
    pub launch_time: LaunchTime,
    pub rocket: Option<String>,
    pub mission: Option<String>,
    pub provider: Option<String>,
    pub detail_link: Option<String>,
    pub live_link: Option<String>,
    pub location: Option<String>,
}

impl LaunchRecord {
    /// A record with only a source and a time; everything else unknown.
    pub fn bare(source: impl Into<String>, launch_time: LaunchTime) -> Self {
        Self {
            source: source.into(),
            launch_time,
            rocket: None,
            mission: None,
            provider: None,
            detail_link: None,
            live_link: None,
            location: None,
        }
    }

    pub fn rocket(mut self, v: impl Into<String>) -> Self {
        self.rocket = non_empty(v.into());
        self
    }

    pub fn mission(mut self, v: impl Into<String>) -> Self {
        self.mission = non_empty(v.into());
        self
    }

    pub fn provider(mut self, v: impl Into<String>) -> Self {
        self.provider = non_empty(v.into());
        self
    }

    pub fn detail_link(mut self, v: impl Into<String>) -> Self {
        self.detail_link = non_empty(v.into());
        self
    }

    pub fn live_link(mut self, v: impl Into<String>) -> Self {
        self.live_link = non_empty(v.into());
        self
    }

    pub fn location(mut self, v: impl Into<String>) -> Self {
        self.location = non_empty(v.into());
        self
    }
}

/// Everything one adapter returned in one poll, ascending by launch time.
/// A source that failed to fetch reports an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReport {
    pub source: String,
    pub records: Vec<LaunchRecord>,
}

impl SourceReport {
    pub fn new(source: impl Into<String>, mut records: Vec<LaunchRecord>) -> Self {
        records.sort_by_key(|r| r.launch_time);
        Self {
            source: source.into(),
            records,
        }
    }

    pub fn empty(source: impl Into<String>) -> Self {
        Self::new(source, Vec::new())
    }
}

/// One poll's reports, in configured source order (the tie-break order).
pub type SourceBatch = Vec<SourceReport>;

/// Reconciled, cross-source representation of one launch event.
///
/// `PartialEq` compares every field. Use [`CanonicalLaunch::key`] or
/// [`CanonicalLaunch::is_same_launch`] for identity, which ignores links so a
/// refreshed live stream does not turn into a new launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalLaunch {
    pub launch_time: LaunchTime,
    pub rocket: Option<String>,
    pub mission: Option<String>,
    pub provider: Option<String>,
    pub detail_link: Option<String>,
    pub live_link: Option<String>,
    pub location: Option<String>,
}

/// Identity of a launch across polls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LaunchKey {
    pub launch_time: LaunchTime,
    pub rocket: Option<String>,
    pub mission: Option<String>,
    pub provider: Option<String>,
    pub location: Option<String>,
}

impl CanonicalLaunch {
    /// Placeholder used when no source supplied a usable time.
    pub fn unknown() -> Self {
        Self {
            launch_time: LaunchTime::Unknown,
            rocket: None,
            mission: None,
            provider: None,
            detail_link: None,
            live_link: None,
            location: None,
        }
    }

    pub fn key(&self) -> LaunchKey {
        LaunchKey {
            launch_time: self.launch_time,
            rocket: self.rocket.clone(),
            mission: self.mission.clone(),
            provider: self.provider.clone(),
            location: self.location.clone(),
        }
    }

    pub fn is_same_launch(&self, other: &CanonicalLaunch) -> bool {
        self.launch_time == other.launch_time
            && self.rocket == other.rocket
            && self.mission == other.mission
            && self.provider == other.provider
            && self.location == other.location
    }

    /// Seconds until liftoff at `now`; negative once passed.
    pub fn seconds_left(&self, now: i64) -> Option<i64> {
        self.launch_time.known().map(|t| t.saturating_sub(now))
    }

    /// `"<rocket> (<provider>) | <mission>"`, unknown parts spelled out.
    pub fn summary(&self) -> String {
        format!(
            "{} ({}) | {}",
            self.rocket.as_deref().unwrap_or("Unknown"),
            self.provider.as_deref().unwrap_or("Unknown"),
            self.mission.as_deref().unwrap_or("Unknown"),
        )
    }
}

impl From<&LaunchRecord> for CanonicalLaunch {
    fn from(r: &LaunchRecord) -> Self {
        Self {
            launch_time: r.launch_time,
            rocket: r.rocket.clone(),
            mission: r.mission.clone(),
            provider: r.provider.clone(),
            detail_link: r.detail_link.clone(),
            live_link: r.live_link.clone(),
            location: r.location.clone(),
        }
    }
}

fn non_empty(s: String) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_sorts_after_every_known_time() {
        let mut v = vec![
            LaunchTime::Unknown,
            LaunchTime::At(i64::MAX),
            LaunchTime::At(-5),
        ];
        v.sort();
        assert_eq!(
            v,
            vec![LaunchTime::At(-5), LaunchTime::At(i64::MAX), LaunchTime::Unknown]
        );
    }

    #[test]
    fn identity_ignores_links() {
        let a = CanonicalLaunch::from(
            &LaunchRecord::bare("a", LaunchTime::At(100))
                .rocket("Falcon 9")
                .mission("Starlink")
                .live_link("https://youtube.com/old"),
        );
        let mut b = a.clone();
        b.live_link = Some("https://youtube.com/new".into());
        b.detail_link = Some("https://example.test".into());
        assert!(a.is_same_launch(&b));
        assert_eq!(a.key(), b.key());
        assert_ne!(a, b);

        b.location = Some("LC-39A".into());
        assert!(!a.is_same_launch(&b));
    }

    #[test]
    fn seconds_left_saturates_on_extreme_times() {
        let past = CanonicalLaunch::from(&LaunchRecord::bare("x", LaunchTime::At(i64::MIN)));
        assert_eq!(past.seconds_left(1_800_000_000), Some(i64::MIN));
        let far = CanonicalLaunch::from(&LaunchRecord::bare("x", LaunchTime::At(i64::MAX)));
        assert_eq!(far.seconds_left(-1), Some(i64::MAX));
        assert_eq!(CanonicalLaunch::unknown().seconds_left(0), None);
    }

    #[test]
    fn builder_drops_blank_fields() {
        let r = LaunchRecord::bare("x", LaunchTime::Unknown)
            .rocket("   ")
            .mission(" Crew-9 ");
        assert_eq!(r.rocket, None);
        assert_eq!(r.mission.as_deref(), Some("Crew-9"));
    }
}
