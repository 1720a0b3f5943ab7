// src/ingest/providers/mod.rs
pub mod next_spaceflight;
pub mod rocketlaunch_live;

use anyhow::{Context, Result};
use std::time::Duration;

use crate::ingest::config::SourcesCfg;
use crate::ingest::types::SiteAdapter;

use next_spaceflight::NextSpaceflight;
use rocketlaunch_live::RocketLaunchLive;

/// Shared HTTP client for all sites.
pub fn build_client(cfg: &SourcesCfg) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .user_agent(cfg.user_agent.clone())
        .build()
        .context("building http client")
}

/// Live adapters for every enabled source, in configured order.
/// Unknown ids are skipped with a warning.
pub fn build_adapters(cfg: &SourcesCfg) -> Result<Vec<Box<dyn SiteAdapter>>> {
    let client = build_client(cfg)?;
    let mut out: Vec<Box<dyn SiteAdapter>> = Vec::with_capacity(cfg.enabled.len());
    for id in &cfg.enabled {
        if id.eq_ignore_ascii_case(rocketlaunch_live::SOURCE_ID) {
            out.push(Box::new(RocketLaunchLive::from_url(
                rocketlaunch_live::DEFAULT_URL,
                client.clone(),
            )));
        } else if id.eq_ignore_ascii_case(next_spaceflight::SOURCE_ID) {
            out.push(Box::new(NextSpaceflight::from_url(
                next_spaceflight::DEFAULT_URL,
                client.clone(),
            )));
        } else {
            tracing::warn!(source = %id, "unknown source id in config, skipping");
        }
    }
    Ok(out)
}

/// GET `url` and return the body; non-2xx is an error.
pub(crate) async fn get_text(client: &reqwest::Client, url: &str) -> Result<String> {
    client
        .get(url)
        .send()
        .await
        .with_context(|| format!("GET {url}"))?
        .error_for_status()
        .with_context(|| format!("GET {url} non-2xx"))?
        .text()
        .await
        .with_context(|| format!("reading body of {url}"))
}
