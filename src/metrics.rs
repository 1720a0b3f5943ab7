use anyhow::Context;
use axum::{routing::get, Router};
use metrics::{describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Static gauge with the configured re-poll ceiling.
fn record_static(max_repoll_secs: u64) {
    describe_gauge!(
        "scheduler_max_repoll_secs",
        "Configured longest time between two polls, in seconds."
    );
    gauge!("scheduler_max_repoll_secs").set(max_repoll_secs as f64);
}

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Can only succeed once per
    /// process.
    pub fn init(max_repoll_secs: u64) -> anyhow::Result<Self> {
        // Use default buckets to avoid API differences across crate versions.
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        record_static(max_repoll_secs);

        Ok(Self { handle })
    }

    /// Recorder not installed globally; for tests.
    pub fn detached() -> Self {
        Self {
            handle: PrometheusBuilder::new().build_recorder().handle(),
        }
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
