//! # Rocket Catalog
//!
//! Maps vehicle display names (as scraped, e.g. "Falcon 9 Block 5") to
//! rocket families ("Falcon 9"), which is the unit users block and unblock.
//!
//! - Loads from a CSV with `name,family,status,provider,country` columns.
//! - Case-insensitive lookup with normalization of punctuation, dashes, etc.
//! - Fallback order: exact name → longest name/family prefix → fuzzy name
//!   match → the display name itself.
//! - `tree()` groups families that still fly by country and provider for
//!   the preferences view.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::{fs, path::Path};

/// Minimum Jaro-Winkler similarity for a fuzzy name match.
const FUZZY_MIN: f64 = 0.92;

/// One catalog row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RocketEntry {
    pub name: String,
    pub family: String,
    pub status: String,
    pub provider: String,
    pub country: String,
}

impl RocketEntry {
    /// Families still launching or about to.
    pub fn is_current(&self) -> bool {
        matches!(
            self.status.to_ascii_lowercase().as_str(),
            "active" | "development"
        )
    }
}

/// country → provider → family → allowed
pub type FamilyTree = BTreeMap<String, BTreeMap<String, BTreeMap<String, bool>>>;

#[derive(Debug, Clone, Default)]
pub struct RocketCatalog {
    entries: Vec<RocketEntry>,
}

impl RocketCatalog {
    pub fn new(entries: Vec<RocketEntry>) -> Self {
        Self { entries }
    }

    /// Load from a CSV file. Missing or unreadable file → empty catalog
    /// (every rocket is then its own family).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path)
            .with_context(|| format!("reading rocket catalog {}", path.display()))
            .and_then(|s| Self::from_csv_str(&s))
        {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = ?e, "rocket catalog unavailable, using display names as families");
                Self::default()
            }
        }
    }

    /// Parse CSV content; the first line is a header. Short rows are an error.
    pub fn from_csv_str(s: &str) -> Result<Self> {
        let mut entries = Vec::new();
        for (i, line) in s.lines().enumerate().skip(1) {
            if line.trim().is_empty() {
                continue;
            }
            let f: Vec<&str> = line.split(',').map(str::trim).collect();
            if f.len() < 5 {
                anyhow::bail!("rocket catalog line {}: expected 5 fields, got {}", i + 1, f.len());
            }
            entries.push(RocketEntry {
                name: f[0].to_string(),
                family: f[1].to_string(),
                status: f[2].to_string(),
                provider: f[3].to_string(),
                country: f[4].to_string(),
            });
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[RocketEntry] {
        &self.entries
    }

    /// Resolve a scraped vehicle name to its family.
    pub fn family_of(&self, rocket: &str) -> String {
        let r = normalize(rocket);
        if r.is_empty() {
            return rocket.trim().to_string();
        }

        // 1) Exact name match.
        if let Some(e) = self.entries.iter().find(|e| normalize(&e.name) == r) {
            return e.family.clone();
        }

        // 2) Longest name or family the vehicle starts with.
        let mut best: Option<(usize, &RocketEntry)> = None;
        for e in &self.entries {
            for cand in [normalize(&e.name), normalize(&e.family)] {
                if starts_with_word(&r, &cand) && best.is_none_or(|(n, _)| cand.len() > n) {
                    best = Some((cand.len(), e));
                }
            }
        }
        if let Some((_, e)) = best {
            return e.family.clone();
        }

        // 3) Fuzzy name match.
        let fuzzy = self
            .entries
            .iter()
            .map(|e| (strsim::jaro_winkler(&normalize(&e.name), &r), e))
            .filter(|(score, _)| *score >= FUZZY_MIN)
            .max_by(|a, b| a.0.total_cmp(&b.0));
        if let Some((_, e)) = fuzzy {
            return e.family.clone();
        }

        // 4) Unknown vehicle is its own family.
        rocket.trim().to_string()
    }

    /// Whether `rocket` belongs to a blocked family.
    pub fn is_blocked(&self, rocket: Option<&str>, blocked: &BTreeSet<String>) -> bool {
        let Some(rocket) = rocket else {
            return false;
        };
        if blocked.is_empty() {
            return false;
        }
        let family = normalize(&self.family_of(rocket));
        blocked.iter().any(|b| normalize(b) == family)
    }

    /// Current families grouped by country and provider, with allowed flags.
    pub fn tree(&self, blocked: &BTreeSet<String>) -> FamilyTree {
        let blocked_norm: BTreeSet<String> = blocked.iter().map(|b| normalize(b)).collect();
        let mut tree = FamilyTree::new();
        for e in self.entries.iter().filter(|e| e.is_current()) {
            tree.entry(e.country.clone())
                .or_default()
                .entry(e.provider.clone())
                .or_default()
                .insert(e.family.clone(), !blocked_norm.contains(&normalize(&e.family)));
        }
        tree
    }

    /// Every family name in the catalog, sorted.
    pub fn families(&self) -> BTreeSet<String> {
        self.entries.iter().map(|e| e.family.clone()).collect()
    }
}

/// Lowercase, dashes/slashes/underscores to spaces, collapse whitespace.
fn normalize(s: &str) -> String {
    let mut out = s.trim().to_ascii_lowercase();
    for ch in ['—', '–', '-', '_', '/', '\\'] {
        out = out.replace(ch, " ");
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `hay` starts with `prefix` as whole words ("falcon 9 block 5" / "falcon 9",
/// but not "falcon 90").
fn starts_with_word(hay: &str, prefix: &str) -> bool {
    !prefix.is_empty()
        && hay.starts_with(prefix)
        && (hay.len() == prefix.len() || hay[prefix.len()..].starts_with(' '))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "name,family,status,provider,country
Falcon 9 Block 5,Falcon 9,Active,SpaceX,USA
Falcon Heavy,Falcon Heavy,Active,SpaceX,USA
Falcon 1,Falcon 1,Retired,SpaceX,USA
Electron,Electron,Active,Rocket Lab,USA
Long March 2D,Long March 2,Active,CASC,China
Zhuque-2,Zhuque,Active,LandSpace,China
";

    fn cat() -> RocketCatalog {
        RocketCatalog::from_csv_str(CSV).unwrap()
    }

    #[test]
    fn exact_and_case_insensitive() {
        assert_eq!(cat().family_of("FALCON 9 BLOCK 5"), "Falcon 9");
        assert_eq!(cat().family_of("Long March 2D"), "Long March 2");
    }

    #[test]
    fn prefix_match_on_word_boundary() {
        let c = cat();
        assert_eq!(c.family_of("Falcon 9"), "Falcon 9");
        assert_eq!(c.family_of("Electron/Curie"), "Electron");
        assert!(!starts_with_word("falcon 90", "falcon 9"));
    }

    #[test]
    fn fuzzy_and_dash_normalization() {
        let c = cat();
        assert_eq!(c.family_of("Electorn"), "Electron");
        assert_eq!(c.family_of("Zhuque 2"), "Zhuque");
        assert_eq!(c.family_of("Long March-2D"), "Long March 2");
    }

    #[test]
    fn unknown_vehicle_is_its_own_family() {
        assert_eq!(cat().family_of("  Kairos "), "Kairos");
    }

    #[test]
    fn blocking_by_family() {
        let c = cat();
        let blocked: BTreeSet<String> = ["falcon 9".to_string()].into();
        assert!(c.is_blocked(Some("Falcon 9 Block 5"), &blocked));
        assert!(!c.is_blocked(Some("Falcon Heavy"), &blocked));
        assert!(!c.is_blocked(None, &blocked));
    }

    #[test]
    fn tree_skips_retired_and_marks_blocked() {
        let c = cat();
        let blocked: BTreeSet<String> = ["Electron".to_string()].into();
        let t = c.tree(&blocked);
        let spacex = &t["USA"]["SpaceX"];
        assert_eq!(spacex.get("Falcon 9"), Some(&true));
        assert!(!spacex.contains_key("Falcon 1"));
        assert_eq!(t["USA"]["Rocket Lab"].get("Electron"), Some(&false));
        assert!(t["China"].contains_key("CASC"));
    }

    #[test]
    fn short_rows_are_rejected() {
        assert!(RocketCatalog::from_csv_str("h\nFalcon 9,Falcon 9\n").is_err());
    }
}
