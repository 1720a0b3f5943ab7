// src/ingest/providers/next_spaceflight.rs
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use metrics::{counter, histogram};
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::ingest::html::{absolutize, blocks, capture, capture_text, text_lines};
use crate::ingest::providers::get_text;
use crate::ingest::types::SiteAdapter;
use crate::launch::{LaunchRecord, LaunchTime};

pub const SOURCE_ID: &str = "nextspaceflight";
pub const DEFAULT_URL: &str = "https://nextspaceflight.com/launches";
const ORIGIN: &str = "https://nextspaceflight.com";

/// e.g. `Sat Aug 03, 2019 22:51 UTC`
const TIME_FORMAT: &str = "%a %b %d, %Y %H:%M";

struct Patterns {
    block: Regex,
    href: Regex,
    title: Regex,
    provider: Regex,
    details: Regex,
}

fn patterns() -> &'static Patterns {
    static P: OnceCell<Patterns> = OnceCell::new();
    P.get_or_init(|| Patterns {
        block: Regex::new(r#"(?i)<div\s[^>]*class="[^"]*\bdemo-card-square\b[^"]*""#).unwrap(),
        href: Regex::new(r#"(?is)<a\s[^>]*href="([^"]*)""#).unwrap(),
        title: Regex::new(r#"(?is)<h5[^>]*>(.*?)</h5>"#).unwrap(),
        provider: Regex::new(
            r#"(?is)class="[^"]*\bmdl-card__title-text\b[^"]*"[^>]*>(.*?)</div>"#,
        )
        .unwrap(),
        details: Regex::new(
            r#"(?is)class="[^"]*\bmdl-card__supporting-text\b[^"]*"[^>]*>(.*?)</div>"#,
        )
        .unwrap(),
    })
}

/// nextspaceflight.com launch list: one card per upcoming launch.
pub struct NextSpaceflight {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl NextSpaceflight {
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
            .map(parse_card)
            .collect();
        out.sort_by_key(|r| r.launch_time);

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("ingest_parse_ms").record(ms);
        counter!("ingest_records_total").increment(out.len() as u64);
        out
    }
}

/// `NET ...` means no exact time yet; anything but a UTC timestamp is
/// treated the same way.
pub fn parse_card_time(line: &str) -> LaunchTime {
    let line = line.trim();
    if line.starts_with("NET") {
        return LaunchTime::Unknown;
    }
    let Some(naive) = line.strip_suffix("UTC").map(str::trim) else {
        tracing::debug!(source = SOURCE_ID, line, "launch time not in UTC");
        return LaunchTime::Unknown;
    };
    match NaiveDateTime::parse_from_str(naive, TIME_FORMAT) {
        Ok(dt) => LaunchTime::At(dt.and_utc().timestamp()),
        Err(e) => {
            tracing::debug!(source = SOURCE_ID, line, error = %e, "unparseable launch time");
            LaunchTime::Unknown
        }
    }
}

fn parse_card(block: &str) -> LaunchRecord {
    let p = patterns();

    let lines = capture(block, &p.details, 1)
        .map(text_lines)
        .unwrap_or_default();
    let launch_time = lines
        .first()
        .map(|l| parse_card_time(l))
        .unwrap_or(LaunchTime::Unknown);

    let mut rec = LaunchRecord::bare(SOURCE_ID, launch_time);

    if lines.len() > 1 {
        if let Some(loc) = lines.last() {
            rec = rec.location(loc.clone());
        }
    }

    // Title is "<rocket> | <mission>".
    if let Some(title) = capture_text(block, &p.title, 1) {
        let mut parts = title.splitn(2, " | ");
        if let Some(rocket) = parts.next() {
            rec = rec.rocket(rocket);
        }
        if let Some(mission) = parts.next() {
            rec = rec.mission(mission);
        }
    }
    if let Some(v) = capture_text(block, &p.provider, 1) {
        rec = rec.provider(v);
    }

    // First anchor is the details page, a second one the webcast.
    let mut hrefs = p
        .href
        .captures_iter(block)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()));
    if let Some(h) = hrefs.next() {
        rec = rec.detail_link(absolutize(ORIGIN, &h));
    }
    if let Some(h) = hrefs.next() {
        rec = rec.live_link(absolutize(ORIGIN, &h));
    }
    rec
}

#[async_trait]
impl SiteAdapter for NextSpaceflight {
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
