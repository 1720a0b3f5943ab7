//! Seeded synthetic batches for the reconciliation engine.
//!
//! Each batch is a handful of well separated launch groups (reports within
//! 25 s of each other, groups an hour apart) plus per-source noise reports
//! that nobody corroborates. Knowing the groups lets us state exactly which
//! launches must come out.

use launch_alert::launch::LaunchKey;
use launch_alert::reconcile::{corroboration_threshold, reconcile, reconcile_detailed};
use launch_alert::{LaunchRecord, LaunchTime, ReconcileCfg, SourceBatch, SourceReport};
use rand::{rngs::StdRng, Rng, SeedableRng};

const BASE: i64 = 1_800_000_000;
const ROUNDS: u64 = 300;

struct Synth {
    batch: SourceBatch,
    /// Time each corroborated group must be emitted at, ascending.
    expected: Vec<i64>,
}

fn synth(rng: &mut StdRng) -> Synth {
    let n_sources: usize = rng.random_range(1..=8);
    let n_groups: i64 = rng.random_range(0..=10);

    let mut per_source: Vec<Vec<LaunchRecord>> = vec![Vec::new(); n_sources];
    let mut groups: Vec<(i64, usize)> = Vec::new(); // (earliest time, distinct sources)
    let mut noise: Vec<i64> = Vec::new();

    for g in 0..n_groups {
        let center = BASE + g * 3600;
        let mut earliest: Option<i64> = None;
        let mut sources = 0;
        for (s, recs) in per_source.iter_mut().enumerate() {
            if rng.random_bool(0.5) {
                let t = center + rng.random_range(0..25);
                earliest = Some(earliest.map_or(t, |e: i64| e.min(t)));
                sources += 1;
                recs.push(
                    LaunchRecord::bare(format!("s{s}"), LaunchTime::At(t))
                        .rocket(format!("Rocket {g}"))
                        .live_link(format!("https://www.youtube.com/watch?v=g{g}s{s}")),
                );
            }
            if rng.random_bool(0.15) {
                // Far from every group and from other sources' noise.
                let t = center + 600 + s as i64 * 120;
                noise.push(t);
                recs.push(LaunchRecord::bare(format!("s{s}"), LaunchTime::At(t)));
            }
        }
        if let Some(e) = earliest {
            groups.push((e, sources));
        }
    }
    for (s, recs) in per_source.iter_mut().enumerate() {
        if rng.random_bool(0.2) {
            recs.push(LaunchRecord::bare(format!("s{s}"), LaunchTime::Unknown).rocket("NET"));
        }
    }

    let batch: SourceBatch = per_source
        .into_iter()
        .enumerate()
        .map(|(s, recs)| SourceReport::new(format!("s{s}"), recs))
        .collect();

    let responsive = batch.iter().filter(|r| !r.records.is_empty()).count();
    let threshold = corroboration_threshold(responsive, 40);

    let mut expected: Vec<i64> = groups
        .iter()
        .filter(|(_, n)| *n >= threshold)
        .map(|(t, _)| *t)
        .collect();
    if threshold <= 1 {
        expected.extend(noise);
    }
    expected.sort_unstable();

    Synth { batch, expected }
}

#[test]
fn emits_exactly_the_corroborated_groups() {
    let cfg = ReconcileCfg::default();
    let mut rng = StdRng::seed_from_u64(0x1a0c_4);
    for round in 0..ROUNDS {
        let s = synth(&mut rng);
        let got: Vec<i64> = reconcile(&s.batch, &cfg)
            .iter()
            .map(|l| l.launch_time.known().expect("unknown time emitted"))
            .collect();
        assert_eq!(got, s.expected, "round {round}");
    }
}

#[test]
fn no_emitted_cluster_is_under_threshold() {
    let cfg = ReconcileCfg::default();
    let skew = cfg.max_skew_secs;
    let mut rng = StdRng::seed_from_u64(7);
    for round in 0..ROUNDS {
        let s = synth(&mut rng);
        let out = reconcile_detailed(&s.batch, &cfg);
        for l in &out.launches {
            let t = l.launch_time.known().expect("unknown time emitted");
            // Every member sits within 2 * skew after the emitted time.
            let backing = s
                .batch
                .iter()
                .filter(|src| {
                    src.records.iter().any(|r| match r.launch_time {
                        LaunchTime::At(x) => x >= t && x < t + 2 * skew,
                        LaunchTime::Unknown => false,
                    })
                })
                .count();
            assert!(
                backing >= out.threshold,
                "round {round}: launch at {t} backed by {backing} < {}",
                out.threshold
            );
        }
    }
}

#[test]
fn output_sorted_and_idempotent() {
    let cfg = ReconcileCfg::default();
    let mut rng = StdRng::seed_from_u64(42);
    for round in 0..ROUNDS {
        let s = synth(&mut rng);
        let first = reconcile(&s.batch, &cfg);
        assert!(
            first.windows(2).all(|w| w[0].launch_time <= w[1].launch_time),
            "round {round}: not ascending"
        );
        assert_eq!(first, reconcile(&s.batch, &cfg), "round {round}: not idempotent");
    }
}

#[test]
fn identity_survives_live_link_changes() {
    let cfg = ReconcileCfg::default();
    let mut rng = StdRng::seed_from_u64(99);
    for round in 0..ROUNDS {
        let s = synth(&mut rng);
        let before: Vec<LaunchKey> = reconcile(&s.batch, &cfg).iter().map(|l| l.key()).collect();

        let mut changed = s.batch.clone();
        for src in &mut changed {
            for r in &mut src.records {
                if r.live_link.is_some() {
                    r.live_link = Some(format!("https://stream.test/{round}"));
                }
            }
        }
        let after: Vec<LaunchKey> = reconcile(&changed, &cfg).iter().map(|l| l.key()).collect();
        assert_eq!(before, after, "round {round}");
    }
}
