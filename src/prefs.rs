//! # Preferences
//! Which rocket families the user has blocked. The scheduler asks before
//! every notification; the API reads and replaces the set.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

fn default_prefs_path() -> PathBuf {
    PathBuf::from("state/preferences.json")
}
fn default_catalog_path() -> PathBuf {
    PathBuf::from("data/rockets.csv")
}

/// `[prefs]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefsCfg {
    #[serde(default = "default_prefs_path")]
    pub path: PathBuf,
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,
}

impl Default for PrefsCfg {
    fn default() -> Self {
        Self {
            path: default_prefs_path(),
            catalog_path: default_catalog_path(),
        }
    }
}

/// Source of the blocked-family set.
pub trait PreferenceStore: Send + Sync {
    fn blocked_families(&self) -> Result<BTreeSet<String>>;
    fn set_blocked_families(&self, families: &BTreeSet<String>) -> Result<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PrefsFile {
    #[serde(default)]
    blocked_rockets: BTreeSet<String>,
}

/// JSON file store: `{"blocked_rockets": ["Falcon 9", ...]}`.
///
/// Read once, then served from memory; writes go to a temp file that is
/// renamed over the original.
#[derive(Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
    cache: RwLock<Option<BTreeSet<String>>>,
}

impl FilePreferenceStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cache: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(&self) -> Result<BTreeSet<String>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()))
            }
        };
        if raw.trim().is_empty() {
            return Ok(BTreeSet::new());
        }
        let file: PrefsFile = serde_json::from_str(&raw)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(clean(file.blocked_rockets.iter()))
    }

    fn write_file(&self, families: &BTreeSet<String>) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        let body = serde_json::to_string_pretty(&PrefsFile {
            blocked_rockets: families.clone(),
        })?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn blocked_families(&self) -> Result<BTreeSet<String>> {
        if let Some(cached) = self
            .cache
            .read()
            .map_err(|_| anyhow::anyhow!("prefs cache poisoned"))?
            .as_ref()
        {
            return Ok(cached.clone());
        }
        let loaded = self.read_file()?;
        *self
            .cache
            .write()
            .map_err(|_| anyhow::anyhow!("prefs cache poisoned"))? = Some(loaded.clone());
        Ok(loaded)
    }

    fn set_blocked_families(&self, families: &BTreeSet<String>) -> Result<()> {
        let families = clean(families.iter());
        self.write_file(&families)?;
        *self
            .cache
            .write()
            .map_err(|_| anyhow::anyhow!("prefs cache poisoned"))? = Some(families.clone());
        tracing::info!(blocked = families.len(), path = %self.path.display(), "preferences saved");
        Ok(())
    }
}

/// In-memory store for tests and tools.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    blocked: RwLock<BTreeSet<String>>,
}

impl MemoryPreferenceStore {
    pub fn new<I, S>(blocked: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items: Vec<String> = blocked.into_iter().map(Into::into).collect();
        Self {
            blocked: RwLock::new(clean(items.iter())),
        }
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn blocked_families(&self) -> Result<BTreeSet<String>> {
        Ok(self
            .blocked
            .read()
            .map_err(|_| anyhow::anyhow!("prefs poisoned"))?
            .clone())
    }

    fn set_blocked_families(&self, families: &BTreeSet<String>) -> Result<()> {
        *self
            .blocked
            .write()
            .map_err(|_| anyhow::anyhow!("prefs poisoned"))? = clean(families.iter());
        Ok(())
    }
}

/// Trim and drop blank names.
fn clean<'a>(items: impl Iterator<Item = &'a String>) -> BTreeSet<String> {
    items
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
