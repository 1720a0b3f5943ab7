//! # Notification Scheduler
//! Owns the polling loop. Each iteration picks the soonest unreached
//! threshold across all allowed launches, waits for it in short clock-checked
//! ticks, re-polls every site and then fires the threshold's alert if the
//! launch is still there. Distant launches only trigger a periodic re-poll.

pub mod clock;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::catalog::RocketCatalog;
use crate::countdown::{beautify_seconds, Threshold, THRESHOLDS};
use crate::ingest::{self, types::SiteAdapter};
use crate::launch::CanonicalLaunch;
use crate::notify::{FiredLedger, Notification, PresenterMux};
use crate::prefs::PreferenceStore;
use crate::reconcile::ReconcileCfg;

pub use clock::{Clock, ManualClock, SystemClock};

fn default_max_repoll_secs() -> u64 {
    1800
}
fn default_wake_tick_ms() -> u64 {
    1000
}

/// `[scheduler]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerCfg {
    /// Longest time between two polls.
    #[serde(default = "default_max_repoll_secs")]
    pub max_repoll_secs: u64,
    /// Granularity of the drift-safe wait.
    #[serde(default = "default_wake_tick_ms")]
    pub wake_tick_ms: u64,
}

impl Default for SchedulerCfg {
    fn default() -> Self {
        Self {
            max_repoll_secs: default_max_repoll_secs(),
            wake_tick_ms: default_wake_tick_ms(),
        }
    }
}

/// What the next iteration will wait for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// Fire `threshold` for `launch` at unix time `at`.
    Threshold {
        launch: CanonicalLaunch,
        threshold: Threshold,
        at: i64,
    },
    /// Nothing due soon: just re-poll at `at`.
    Repoll { at: i64 },
}

impl Plan {
    pub fn at(&self) -> i64 {
        match self {
            Plan::Threshold { at, .. } | Plan::Repoll { at } => *at,
        }
    }
}

/// Result of one [`Scheduler::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Notified(Notification),
    /// The launch was gone after the re-poll (scrubbed, moved, renamed).
    Vanished,
    /// Still there but blocked or already notified for this threshold.
    Suppressed,
    Repolled,
}

pub struct Scheduler {
    adapters: Vec<Box<dyn SiteAdapter>>,
    reconcile: ReconcileCfg,
    cfg: SchedulerCfg,
    presenters: PresenterMux,
    prefs: Arc<dyn PreferenceStore>,
    catalog: Arc<RocketCatalog>,
    clock: Arc<dyn Clock>,
    tracked: Vec<CanonicalLaunch>,
    fired: FiredLedger,
    publish: Option<watch::Sender<Vec<CanonicalLaunch>>>,
}

impl Scheduler {
    pub fn new(
        adapters: Vec<Box<dyn SiteAdapter>>,
        reconcile: ReconcileCfg,
        cfg: SchedulerCfg,
        presenters: PresenterMux,
        prefs: Arc<dyn PreferenceStore>,
        catalog: Arc<RocketCatalog>,
    ) -> Self {
        Self {
            adapters,
            reconcile,
            cfg,
            presenters,
            prefs,
            catalog,
            clock: Arc::new(SystemClock),
            tracked: Vec::new(),
            fired: FiredLedger::new(),
            publish: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Every refreshed launch list is sent here.
    pub fn with_publisher(mut self, tx: watch::Sender<Vec<CanonicalLaunch>>) -> Self {
        self.publish = Some(tx);
        self
    }

    pub fn tracked(&self) -> &[CanonicalLaunch] {
        &self.tracked
    }

    pub fn fired(&self) -> &FiredLedger {
        &self.fired
    }

    /// Poll every site, reconcile and replace the tracked list wholesale.
    pub async fn refresh(&mut self) {
        let out = ingest::poll(&self.adapters, &self.reconcile).await;
        self.tracked = out.launches;
        if let Some(tx) = &self.publish {
            tx.send_replace(self.tracked.clone());
        }
    }

    fn blocked(&self) -> BTreeSet<String> {
        self.prefs.blocked_families().unwrap_or_else(|e| {
            tracing::warn!(error = ?e, "preferences unreadable, nothing blocked this cycle");
            BTreeSet::new()
        })
    }

    pub fn is_blocked(&self, launch: &CanonicalLaunch, blocked: &BTreeSet<String>) -> bool {
        self.catalog.is_blocked(launch.rocket.as_deref(), blocked)
    }

    /// First poll plus an immediate alert for the earliest allowed launch,
    /// headed with the real remaining time.
    pub async fn startup(&mut self) -> Option<Notification> {
        self.refresh().await;
        let now = self.clock.now();
        let blocked = self.blocked();
        let first = self
            .tracked
            .iter()
            .find(|l| l.launch_time.is_known() && !self.is_blocked(l, &blocked))?;
        let remaining = first.seconds_left(now)?;

        let n = Notification::for_launch(first, beautify_seconds(remaining));
        tracing::info!(launch = %first.summary(), remaining, "startup notification");
        self.presenters.present(&n).await;
        Some(n)
    }

    /// Pick the soonest threshold still ahead among allowed launches.
    /// Falls back to a re-poll when it is further out than `max_repoll_secs`
    /// or nothing is upcoming.
    pub fn plan(&self, now: i64) -> Plan {
        let blocked = self.blocked();
        let max_repoll = i64::try_from(self.cfg.max_repoll_secs.max(1)).unwrap_or(i64::MAX);

        let mut best: Option<(i64, &CanonicalLaunch, Threshold)> = None;
        for launch in &self.tracked {
            if self.is_blocked(launch, &blocked) {
                continue;
            }
            let Some(t) = launch.launch_time.known() else {
                continue;
            };
            let key = launch.key();
            let remaining = t.saturating_sub(now);
            // Largest threshold strictly below `remaining` not yet fired.
            let next = THRESHOLDS
                .iter()
                .rev()
                .filter(|thr| thr.secs_before < remaining)
                .find(|thr| self.fired.should_fire(&key, thr.secs_before));
            let Some(thr) = next else {
                continue;
            };
            let at = t.saturating_sub(thr.secs_before);
            if best.is_none_or(|(b, _, _)| at < b) {
                best = Some((at, launch, *thr));
            }
        }

        match best {
            Some((at, launch, threshold)) if at.saturating_sub(now) < max_repoll => Plan::Threshold {
                launch: launch.clone(),
                threshold,
                at,
            },
            _ => Plan::Repoll {
                at: now.saturating_add(max_repoll),
            },
        }
    }

    /// Sleep in ticks of at most `wake_tick_ms`, re-reading the clock each
    /// time, until `target` is reached. Returns the wake-up time, which is
    /// later than `target` if the machine was suspended.
    pub async fn wait_until(&self, target: i64) -> i64 {
        let tick = self.cfg.wake_tick_ms.max(1);
        loop {
            let now = self.clock.now();
            if now >= target {
                return now;
            }
            let left_ms = target.abs_diff(now).saturating_mul(1000);
            self.clock
                .sleep(Duration::from_millis(tick.min(left_ms)))
                .await;
        }
    }

    /// One loop iteration: plan, wait, re-poll, maybe notify.
    pub async fn step(&mut self) -> StepOutcome {
        let now = self.clock.now();
        match self.plan(now) {
            Plan::Repoll { at } => {
                tracing::debug!(wait = at.saturating_sub(now), "nothing due, periodic re-poll");
                self.wait_until(at).await;
                self.refresh().await;
                StepOutcome::Repolled
            }
            Plan::Threshold {
                launch,
                threshold,
                at,
            } => {
                tracing::debug!(
                    launch = %launch.summary(),
                    threshold = threshold.label,
                    wait = at.saturating_sub(now),
                    "waiting for threshold"
                );
                let woke = self.wait_until(at).await;
                if woke > at {
                    tracing::info!(late = woke.saturating_sub(at), "woke after threshold instant");
                }
                self.refresh().await;
                self.fire(&launch, threshold).await
            }
        }
    }

    async fn fire(&mut self, planned: &CanonicalLaunch, threshold: Threshold) -> StepOutcome {
        let Some(fresh) = self
            .tracked
            .iter()
            .find(|l| l.is_same_launch(planned))
            .cloned()
        else {
            tracing::info!(launch = %planned.summary(), "launch no longer reported, not notifying");
            return StepOutcome::Vanished;
        };
        let launch = merge_fresh(planned, fresh);
        let key = launch.key();

        let blocked = self.blocked();
        if self.is_blocked(&launch, &blocked) || !self.fired.should_fire(&key, threshold.secs_before) {
            return StepOutcome::Suppressed;
        }

        let n = Notification::for_launch(&launch, threshold.label);
        self.presenters.present(&n).await;
        self.fired.record(key, threshold.secs_before);
        self.fired.prune(self.clock.now());
        tracing::info!(launch = %launch.summary(), threshold = threshold.label, "notified");
        StepOutcome::Notified(n)
    }

    /// Startup notification, then iterate forever.
    pub async fn run(&mut self) {
        tracing::info!(
            sources = self.adapters.len(),
            presenters = ?self.presenters.names(),
            "scheduler started"
        );
        self.startup().await;
        loop {
            self.step().await;
        }
    }
}

/// Same launch, fresher links; a link the new poll lost is kept.
fn merge_fresh(planned: &CanonicalLaunch, fresh: CanonicalLaunch) -> CanonicalLaunch {
    CanonicalLaunch {
        detail_link: fresh.detail_link.or_else(|| planned.detail_link.clone()),
        live_link: fresh.live_link.or_else(|| planned.live_link.clone()),
        ..fresh
    }
}
