// src/config/mod.rs
//! Application config: one TOML file, every section optional, then a few
//! env overrides on top. Values out of range are pulled back, never fatal.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::api::ApiCfg;
use crate::ingest::config::SourcesCfg;
use crate::notify::NotifyCfg;
use crate::prefs::PrefsCfg;
use crate::reconcile::ReconcileCfg;
use crate::scheduler::SchedulerCfg;

pub const DEFAULT_CONFIG_PATH: &str = "config/launch_alert.toml";
pub const ENV_CONFIG_PATH: &str = "LAUNCH_ALERT_CONFIG";

pub const ENV_MAX_REPOLL_SECS: &str = "LAUNCH_MAX_REPOLL_SECS";
pub const ENV_MAX_SKEW_SECS: &str = "LAUNCH_MAX_SKEW_SECS";
pub const ENV_PREFS_PATH: &str = "LAUNCH_PREFS_PATH";
pub const ENV_API_ADDR: &str = "LAUNCH_API_ADDR";
pub const ENV_API_ENABLED: &str = "LAUNCH_API_ENABLED";
pub const ENV_DISCORD_WEBHOOK: &str = "DISCORD_WEBHOOK_URL";
pub const ENV_SLACK_WEBHOOK: &str = "SLACK_WEBHOOK_URL";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub reconcile: ReconcileCfg,
    #[serde(default)]
    pub scheduler: SchedulerCfg,
    #[serde(default)]
    pub sources: SourcesCfg,
    #[serde(default)]
    pub notify: NotifyCfg,
    #[serde(default)]
    pub prefs: PrefsCfg,
    #[serde(default)]
    pub api: ApiCfg,
}

impl AppConfig {
    /// `$LAUNCH_ALERT_CONFIG`, else `config/launch_alert.toml`, else defaults.
    /// An explicit path that is missing, and any file that does not parse,
    /// is an error.
    pub fn load_default() -> anyhow::Result<Self> {
        let explicit = env::var(ENV_CONFIG_PATH).ok().map(PathBuf::from);
        let path = explicit
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        if explicit.is_some() || path.exists() {
            return Self::load_from(&path);
        }
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        let mut cfg = Self::default();
        cfg.apply_env_overrides();
        cfg.sanitize();
        Ok(cfg)
    }

    /// Read `path`, apply env overrides and sanitize.
    pub fn load_from<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let mut cfg = Self::from_toml_str(&data)
            .with_context(|| format!("parsing config {}", path.display()))?;
        cfg.apply_env_overrides();
        cfg.sanitize();
        Ok(cfg)
    }

    /// Parse only; no env, no sanitizing.
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = parse_env_num::<u64>(ENV_MAX_REPOLL_SECS) {
            self.scheduler.max_repoll_secs = v;
        }
        if let Some(v) = parse_env_num::<i64>(ENV_MAX_SKEW_SECS) {
            self.reconcile.max_skew_secs = v;
        }
        if let Some(v) = env_non_blank(ENV_PREFS_PATH) {
            self.prefs.path = PathBuf::from(v);
        }
        if let Some(v) = env_non_blank(ENV_API_ADDR) {
            self.api.addr = v;
        }
        if let Some(v) = env_non_blank(ENV_API_ENABLED) {
            self.api.enabled = matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        if let Some(v) = env_non_blank(ENV_DISCORD_WEBHOOK) {
            self.notify.discord_webhook = Some(v);
        }
        if let Some(v) = env_non_blank(ENV_SLACK_WEBHOOK) {
            self.notify.slack_webhook = Some(v);
        }
    }

    pub fn sanitize(&mut self) {
        self.reconcile.corroboration_pct = self.reconcile.corroboration_pct.clamp(1, 100);
        self.reconcile.max_skew_secs = self.reconcile.max_skew_secs.max(1);
        self.scheduler.max_repoll_secs = self.scheduler.max_repoll_secs.max(1);
        self.scheduler.wake_tick_ms = self.scheduler.wake_tick_ms.clamp(50, 60_000);
        self.sources.sanitize();
    }
}

fn env_non_blank(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// unparsable values are ignored
fn parse_env_num<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_non_blank(key).and_then(|s| s.parse::<T>().ok())
}
