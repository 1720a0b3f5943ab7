// src/ingest/mod.rs
pub mod config;
pub mod html;
pub mod providers;
pub mod types;

use crate::ingest::types::SiteAdapter;
use crate::launch::{SourceBatch, SourceReport};
use crate::reconcile::{reconcile_detailed, ReconcileCfg, Reconciliation};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_records_total", "Launch records parsed from sites.");
        describe_counter!(
            "ingest_source_errors_total",
            "Site fetch/parse errors (source contributed nothing)."
        );
        describe_histogram!("ingest_parse_ms", "Site parse time in milliseconds.");
        describe_counter!(
            "reconcile_emitted_total",
            "Canonical launches emitted by reconciliation."
        );
        describe_counter!(
            "reconcile_discarded_total",
            "Launch reports dropped for lack of corroboration."
        );
        describe_gauge!(
            "scheduler_last_poll_ts",
            "Unix ts when sites were last polled."
        );
    });
}

/// Normalize scraped text: decode entities, strip tags, straighten quotes,
/// collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 5) Length cap: 300 chars
    if out.chars().count() > 300 {
        out = out.chars().take(300).collect();
    }

    out
}

/// Fetch every adapter in order. A failing site is logged and reported as an
/// empty list so the others still count.
pub async fn fetch_all(adapters: &[Box<dyn SiteAdapter>]) -> SourceBatch {
    ensure_metrics_described();

    let mut batch = Vec::with_capacity(adapters.len());
    for a in adapters {
        match a.fetch().await {
            Ok(records) => {
                tracing::debug!(source = a.source_id(), records = records.len(), "site fetched");
                batch.push(SourceReport::new(a.source_id(), records));
            }
            Err(e) => {
                tracing::warn!(error = ?e, source = a.source_id(), "site error");
                counter!("ingest_source_errors_total").increment(1);
                batch.push(SourceReport::empty(a.source_id()));
            }
        }
    }
    batch
}

/// Fetch + reconcile: one full poll.
pub async fn poll(adapters: &[Box<dyn SiteAdapter>], cfg: &ReconcileCfg) -> Reconciliation {
    let batch = fetch_all(adapters).await;
    let out = reconcile_detailed(&batch, cfg);

    // Telemetry
    counter!("reconcile_emitted_total").increment(out.launches.len() as u64);
    counter!("reconcile_discarded_total").increment(out.discarded as u64);
    gauge!("scheduler_last_poll_ts").set(chrono::Utc::now().timestamp() as f64);

    tracing::info!(
        target: "ingest",
        sources = batch.len(),
        responsive = out.responsive_sources,
        threshold = out.threshold,
        launches = out.launches.len(),
        discarded = out.discarded,
        "poll reconciled"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launch::{LaunchRecord, LaunchTime};
    use anyhow::{anyhow, Result};

    #[test]
    fn normalize_text_collapses_ws_and_entities() {
        let s = "  Falcon&nbsp;&nbsp;9 <b>Block 5</b>\n\t ";
        assert_eq!(normalize_text(s), "Falcon 9 Block 5");
    }

    #[test]
    fn normalize_text_keeps_punctuation() {
        assert_eq!(normalize_text("Rocket Lab U.S.A."), "Rocket Lab U.S.A.");
        assert_eq!(normalize_text("&ldquo;Love At First Insight&rdquo;"), "\"Love At First Insight\"");
    }

    struct Fixed(&'static str, Vec<LaunchRecord>);
    struct Broken;

    #[async_trait::async_trait]
    impl SiteAdapter for Fixed {
        async fn fetch(&self) -> Result<Vec<LaunchRecord>> {
            Ok(self.1.clone())
        }
        fn source_id(&self) -> &'static str {
            self.0
        }
    }

    #[async_trait::async_trait]
    impl SiteAdapter for Broken {
        async fn fetch(&self) -> Result<Vec<LaunchRecord>> {
            Err(anyhow!("connection refused"))
        }
        fn source_id(&self) -> &'static str {
            "broken"
        }
    }

    #[tokio::test]
    async fn failing_site_becomes_empty_report_in_place() {
        let adapters: Vec<Box<dyn SiteAdapter>> = vec![
            Box::new(Broken),
            Box::new(Fixed(
                "ok",
                vec![
                    LaunchRecord::bare("ok", LaunchTime::At(50)),
                    LaunchRecord::bare("ok", LaunchTime::At(10)),
                ],
            )),
        ];
        let batch = fetch_all(&adapters).await;
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].source, "broken");
        assert!(batch[0].records.is_empty());
        assert_eq!(batch[1].records[0].launch_time, LaunchTime::At(10));
    }

    #[tokio::test]
    async fn poll_degrades_to_responsive_subset() {
        let adapters: Vec<Box<dyn SiteAdapter>> = vec![
            Box::new(Broken),
            Box::new(Fixed("ok", vec![LaunchRecord::bare("ok", LaunchTime::At(10))])),
        ];
        let out = poll(&adapters, &ReconcileCfg::default()).await;
        assert_eq!(out.responsive_sources, 1);
        assert_eq!(out.launches.len(), 1);
    }
}
