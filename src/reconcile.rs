//! # Reconciliation Engine
//! Pure, testable logic that merges one poll's per-source launch lists into
//! canonical launches. No I/O.
//!
//! Policy: records are pooled and walked in time order. A record and every
//! record within the skew window of it form a cluster; the cluster is
//! emitted only when enough distinct sources back it (default 40% of the
//! sources that answered), otherwise the anchor is dropped as noise. Records
//! within the window of an emitted launch never anchor a new one. Fields
//! of an emitted launch are picked from the cluster so the user is never
//! warned late: earliest time wins, the longest rocket name wins.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::launch::{CanonicalLaunch, LaunchRecord, SourceReport};

fn default_max_skew_secs() -> i64 {
    60
}
fn default_corroboration_pct() -> u32 {
    40
}
fn default_trusted_live_markers() -> Vec<String> {
    ["youtube", "youtu.be", "spacex.com", "nasa.gov", "rocketlab"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Reconciliation knobs, loaded from `[reconcile]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileCfg {
    /// Two reports closer than this (strictly) describe the same launch.
    #[serde(default = "default_max_skew_secs")]
    pub max_skew_secs: i64,
    /// Share of responsive sources, in percent, that must back a cluster.
    #[serde(default = "default_corroboration_pct")]
    pub corroboration_pct: u32,
    /// Substrings that mark a live link as coming from a trusted host.
    #[serde(default = "default_trusted_live_markers")]
    pub trusted_live_markers: Vec<String>,
}

impl Default for ReconcileCfg {
    fn default() -> Self {
        Self {
            max_skew_secs: default_max_skew_secs(),
            corroboration_pct: default_corroboration_pct(),
            trusted_live_markers: default_trusted_live_markers(),
        }
    }
}

/// Result of one reconciliation pass plus the numbers behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Ascending by launch time.
    pub launches: Vec<CanonicalLaunch>,
    /// Sources that returned at least one record.
    pub responsive_sources: usize,
    /// Distinct sources a cluster needed.
    pub threshold: usize,
    /// Anchors dropped for lack of corroboration.
    pub discarded: usize,
}

/// `ceil(pct% * responsive)`, in integers so 40% of 15 stays 6.
pub fn corroboration_threshold(responsive: usize, pct: u32) -> usize {
    let pct = pct.clamp(1, 100) as usize;
    (responsive * pct).div_ceil(100)
}

/// Multi-candidate reconciliation; see [`reconcile_detailed`].
pub fn reconcile(batch: &[SourceReport], cfg: &ReconcileCfg) -> Vec<CanonicalLaunch> {
    reconcile_detailed(batch, cfg).launches
}

#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    /// Position of the source in the batch; the tie-break order.
    rank: usize,
    time: i64,
    rec: &'a LaunchRecord,
}

pub fn reconcile_detailed(batch: &[SourceReport], cfg: &ReconcileCfg) -> Reconciliation {
    let responsive_sources = batch.iter().filter(|s| !s.records.is_empty()).count();
    let threshold = corroboration_threshold(responsive_sources, cfg.corroboration_pct);
    let skew = cfg.max_skew_secs.max(1).unsigned_abs();

    // Unknown times never enter the pool, so they can neither be emitted
    // nor corroborate anything.
    let mut pool: Vec<Candidate<'_>> = batch
        .iter()
        .enumerate()
        .flat_map(|(rank, src)| {
            src.records.iter().filter_map(move |rec| {
                rec.launch_time
                    .known()
                    .map(|time| Candidate { rank, time, rec })
            })
        })
        .collect();
    pool.sort_by_key(|c| (c.time, c.rank));

    // Times of emitted launches; an anchor near one of them is already covered.
    let mut emitted: Vec<i64> = Vec::new();
    let mut launches = Vec::new();
    let mut discarded = 0usize;

    for anchor in &pool {
        if emitted.iter().any(|&t| t.abs_diff(anchor.time) < skew) {
            continue;
        }
        // Members come from the whole pool, in (time, rank) order.
        let cluster: Vec<Candidate<'_>> = pool
            .iter()
            .copied()
            .filter(|c| c.time.abs_diff(anchor.time) < skew)
            .collect();

        let backing: BTreeSet<usize> = cluster.iter().map(|c| c.rank).collect();
        if backing.len() < threshold {
            tracing::trace!(
                time = anchor.time,
                sources = backing.len(),
                threshold,
                "uncorroborated launch dropped"
            );
            discarded += 1;
            continue;
        }

        emitted.push(cluster[0].time);
        launches.push(merge_cluster(&cluster, cfg));
    }

    launches.sort_by_key(|l| l.launch_time);

    Reconciliation {
        launches,
        responsive_sources,
        threshold,
        discarded,
    }
}

/// `cluster` is ordered by (time, rank) and non-empty.
fn merge_cluster(cluster: &[Candidate<'_>], cfg: &ReconcileCfg) -> CanonicalLaunch {
    let anchor = cluster[0];

    // Same members walked in source order for "first found" rules.
    let mut by_source: Vec<Candidate<'_>> = cluster.to_vec();
    by_source.sort_by_key(|c| (c.rank, c.time));

    // Longest rocket name; `>` keeps the earliest source on ties.
    let mut namer: Option<Candidate<'_>> = None;
    for c in &by_source {
        let Some(name) = c.rec.rocket.as_deref() else {
            continue;
        };
        let longer = match namer.and_then(|n| n.rec.rocket.as_deref()) {
            None => true,
            Some(best) => name.chars().count() > best.chars().count(),
        };
        if longer {
            namer = Some(*c);
        }
    }
    let namer = namer.unwrap_or(anchor);

    let live_link = pick_live_link(&by_source, &cfg.trusted_live_markers);

    let location = anchor.rec.location.clone().or_else(|| {
        by_source
            .iter()
            .find_map(|c| c.rec.location.clone())
    });

    CanonicalLaunch {
        launch_time: anchor.rec.launch_time,
        rocket: namer.rec.rocket.clone(),
        mission: namer.rec.mission.clone(),
        provider: namer.rec.provider.clone(),
        detail_link: anchor.rec.detail_link.clone(),
        live_link,
        location,
    }
}

fn pick_live_link(by_source: &[Candidate<'_>], markers: &[String]) -> Option<String> {
    let links: Vec<&str> = by_source
        .iter()
        .filter_map(|c| c.rec.live_link.as_deref())
        .collect();

    links
        .iter()
        .find(|l| is_trusted_live_link(l, markers))
        .or_else(|| links.first())
        .map(|l| l.to_string())
}

pub fn is_trusted_live_link(link: &str, markers: &[String]) -> bool {
    let l = link.to_ascii_lowercase();
    markers
        .iter()
        .any(|m| !m.is_empty() && l.contains(&m.to_ascii_lowercase()))
}

/// Single-candidate mode: only each source's next launch is considered and
/// the earliest dated one is trusted outright, with no corroboration.
/// Lower confidence than [`reconcile`]; kept for "what is next" displays.
///
/// Always returns exactly one launch, fully unknown if nobody answered.
pub fn reconcile_next(batch: &[SourceReport]) -> CanonicalLaunch {
    let heads: Vec<&LaunchRecord> = batch
        .iter()
        .filter_map(|s| s.records.iter().min_by_key(|r| r.launch_time))
        .collect();

    // `min_by_key` keeps the first of equal keys, i.e. the earliest source.
    let anchor = heads
        .iter()
        .copied()
        .filter(|r| r.launch_time.is_known())
        .min_by_key(|r| r.launch_time);

    let Some(anchor) = anchor else {
        let mut out = CanonicalLaunch::unknown();
        out.rocket = first_some(&heads, |r| r.rocket.clone());
        out.mission = first_some(&heads, |r| r.mission.clone());
        out.provider = first_some(&heads, |r| r.provider.clone());
        out.location = first_some(&heads, |r| r.location.clone());
        return out;
    };

    let fill = |own: &Option<String>, get: fn(&LaunchRecord) -> Option<String>| {
        own.clone().or_else(|| first_some(&heads, get))
    };

    CanonicalLaunch {
        launch_time: anchor.launch_time,
        rocket: fill(&anchor.rocket, |r| r.rocket.clone()),
        mission: fill(&anchor.mission, |r| r.mission.clone()),
        provider: fill(&anchor.provider, |r| r.provider.clone()),
        detail_link: fill(&anchor.detail_link, |r| r.detail_link.clone()),
        live_link: fill(&anchor.live_link, |r| r.live_link.clone()),
        location: fill(&anchor.location, |r| r.location.clone()),
    }
}

fn first_some(
    heads: &[&LaunchRecord],
    get: impl Fn(&LaunchRecord) -> Option<String>,
) -> Option<String> {
    heads.iter().find_map(|r| get(r))
}
