// src/ingest/config.rs
use serde::{Deserialize, Serialize};

fn default_enabled() -> Vec<String> {
    vec![
        crate::ingest::providers::rocketlaunch_live::SOURCE_ID.to_string(),
        crate::ingest::providers::next_spaceflight::SOURCE_ID.to_string(),
    ]
}
fn default_timeout_secs() -> u64 {
    20
}
fn default_user_agent() -> String {
    format!("launch-alert/{}", env!("CARGO_PKG_VERSION"))
}

/// `[sources]`: which sites to poll and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesCfg {
    /// Adapter ids, in tie-break order.
    #[serde(default = "default_enabled")]
    pub enabled: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for SourcesCfg {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl SourcesCfg {
    /// Trim, drop blanks and duplicates while keeping the configured order.
    pub fn sanitize(&mut self) {
        self.enabled = clean_list(std::mem::take(&mut self.enabled));
        self.timeout_secs = self.timeout_secs.clamp(1, 300);
    }

    pub fn is_enabled(&self, source_id: &str) -> bool {
        self.enabled.iter().any(|w| w.eq_ignore_ascii_case(source_id))
    }
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if !t.is_empty() && !out.iter().any(|o| o.eq_ignore_ascii_case(t)) {
            out.push(t.to_string());
        }
    }
    out
}
