// src/ingest/providers/rocketlaunch_live.rs
use anyhow::Result;
use async_trait::async_trait;
use metrics::{counter, histogram};
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::ingest::html::{absolutize, blocks, capture, capture_text, text_lines};
use crate::ingest::providers::get_text;
use crate::ingest::types::SiteAdapter;
use crate::launch::{LaunchRecord, LaunchTime};

pub const SOURCE_ID: &str = "rocketlaunch.live";
pub const DEFAULT_URL: &str = "https://www.rocketlaunch.live";
const ORIGIN: &str = "https://www.rocketlaunch.live";

/// The site encodes "sometime this month/quarter/year" as the last seconds of
/// the day (…:57, …:58, …:59). Those are estimates, not launch times.
const ESTIMATE_SECS_OF_DAY: i64 = 86_397;

/// Sortdates outside 1970..2100 are garbage, not launch times.
const PLAUSIBLE_SORTDATE: std::ops::Range<i64> = 0..4_102_444_800;

struct Patterns {
    block: Regex,
    sortdate: Regex,
    mission: Regex,
    vehicle: Regex,
    provider: Regex,
    location: Regex,
    live: Regex,
}

fn patterns() -> &'static Patterns {
    static P: OnceCell<Patterns> = OnceCell::new();
    P.get_or_init(|| Patterns {
        block: Regex::new(r#"(?i)<div\s[^>]*class="launch(?:\s[^"]*)?""#).unwrap(),
        sortdate: Regex::new(r#"(?i)data-sortdate="(-?\d+)""#).unwrap(),
        mission: Regex::new(
            r#"(?is)class="[^"]*\bmission_name\b[^"]*"[^>]*>.*?<h4[^>]*>.*?<a\s[^>]*href="([^"]*)"[^>]*>(.*?)</a>"#,
        )
        .unwrap(),
        vehicle: Regex::new(r#"(?is)class="[^"]*\brlt-vehicle\b[^"]*"[^>]*>.*?<a[^>]*>(.*?)</a>"#)
            .unwrap(),
        provider: Regex::new(r#"(?is)class="[^"]*\brlt-provider\b[^"]*"[^>]*>.*?<a[^>]*>(.*?)</a>"#)
            .unwrap(),
        location: Regex::new(r#"(?is)class="[^"]*\brlt-location\b[^"]*"[^>]*>(.*?)</div>"#)
            .unwrap(),
        live: Regex::new(
            r#"(?is)class="[^"]*\blaunch_live_embed\b[^"]*"[^>]*>.*?<iframe[^>]*\bsrc="([^"]*)""#,
        )
        .unwrap(),
    })
}

/// rocketlaunch.live front page: one `<div class="launch">` per upcoming launch.
pub struct RocketLaunchLive {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl RocketLaunchLive {
    pub fn from_fixture(html: &str) -> Self {
        Self {
            mode: Mode::Fixture(html.to_string()),
        }
    }

    pub fn from_url(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            mode: Mode::Http {
                url: url.into(),
                client,
            },
        }
    }

    /// Parse a listing page. Never fails; broken fields become unknown.
    pub fn parse_page(html: &str) -> Vec<LaunchRecord> {
        let t0 = std::time::Instant::now();
        let p = patterns();

        let mut out: Vec<LaunchRecord> = blocks(html, &p.block)
            .into_iter()
            .map(parse_block)
            .collect();
        out.sort_by_key(|r| r.launch_time);

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("ingest_parse_ms").record(ms);
        counter!("ingest_records_total").increment(out.len() as u64);
        out
    }
}

fn parse_block(block: &str) -> LaunchRecord {
    let p = patterns();

    let launch_time = match capture(block, &p.sortdate, 1).map(str::parse::<i64>) {
        Some(Ok(t)) if !PLAUSIBLE_SORTDATE.contains(&t) => {
            tracing::debug!(source = SOURCE_ID, sortdate = t, "implausible data-sortdate");
            LaunchTime::Unknown
        }
        Some(Ok(t)) if t.rem_euclid(86_400) >= ESTIMATE_SECS_OF_DAY => LaunchTime::Unknown,
        Some(Ok(t)) => LaunchTime::At(t),
        Some(Err(e)) => {
            tracing::debug!(source = SOURCE_ID, error = %e, "bad data-sortdate");
            LaunchTime::Unknown
        }
        None => {
            tracing::debug!(source = SOURCE_ID, "launch block without data-sortdate");
            LaunchTime::Unknown
        }
    };

    let mut rec = LaunchRecord::bare(SOURCE_ID, launch_time);
    if let Some(caps) = p.mission.captures(block) {
        if let Some(href) = caps.get(1) {
            rec = rec.detail_link(absolutize(ORIGIN, href.as_str()));
        }
        if let Some(name) = caps.get(2) {
            rec = rec.mission(crate::ingest::normalize_text(name.as_str()));
        }
    }
    if let Some(v) = capture_text(block, &p.vehicle, 1) {
        rec = rec.rocket(v);
    }
    if let Some(v) = capture_text(block, &p.provider, 1) {
        rec = rec.provider(v);
    }
    if let Some(loc) = capture(block, &p.location, 1) {
        rec = rec.location(text_lines(loc).join(", "));
    }
    if let Some(src) = capture(block, &p.live, 1) {
        rec = rec.live_link(absolutize(ORIGIN, src));
    }
    rec
}

#[async_trait]
impl SiteAdapter for RocketLaunchLive {
    async fn fetch(&self) -> Result<Vec<LaunchRecord>> {
        match &self.mode {
            Mode::Fixture(s) => Ok(Self::parse_page(s)),
            Mode::Http { url, client } => {
                let body = get_text(client, url).await?;
                Ok(Self::parse_page(&body))
            }
        }
    }

    fn source_id(&self) -> &'static str {
        SOURCE_ID
    }
}
