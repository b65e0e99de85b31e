//! Local vulnerability store.
//!
//! One JSON file per installation, `<data-directory>/nvd-store.json`:
//!
//! ```json
//! {
//!   "updated_at": 1760000000,
//!   "advisories": [
//!     {
//!       "id": "CVE-2015-7501",
//!       "package": "commons-collections",
//!       "severity": "CRITICAL",
//!       "affected": [{ "introduced": "3.0", "fixed": "3.2.2" }],
//!       "description": "Deserialization of untrusted data"
//!     }
//!   ]
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::version::is_affected;
use crate::error::EngineError;
use crate::models::{Severity, Vulnerability};

/// Fixed file name of the store inside the data directory.
pub const STORE_FILENAME: &str = "nvd-store.json";

/// Path of the store file for a data directory.
pub fn store_path(data_dir: &Path) -> PathBuf {
    data_dir.join(STORE_FILENAME)
}

/// Affected version range (`introduced <= v < fixed`); a missing bound is open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffectedRange {
    #[serde(default)]
    pub introduced: Option<String>,
    #[serde(default)]
    pub fixed: Option<String>,
}

/// One advisory, as carried by both the remote feed and the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    pub id: String,
    pub package: String,
    #[serde(default)]
    pub severity: String,
    /// Affected ranges. Empty means every version is affected.
    #[serde(default)]
    pub affected: Vec<AffectedRange>,
    #[serde(default)]
    pub description: String,
}

impl Advisory {
    pub fn to_vulnerability(&self) -> Vulnerability {
        Vulnerability {
            id: self.id.clone(),
            severity: Severity::from_label(&self.severity),
            description: self.description.clone(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    updated_at: u64,
    advisories: Vec<Advisory>,
}

/// In-memory view of the store, indexed by lower-cased package name.
#[derive(Debug, Default)]
pub struct VulnStore {
    updated_at: u64,
    advisories: Vec<Advisory>,
    index: HashMap<String, Vec<usize>>,
}

impl VulnStore {
    pub fn from_advisories(advisories: Vec<Advisory>, updated_at: u64) -> Self {
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, advisory) in advisories.iter().enumerate() {
            index
                .entry(advisory.package.to_lowercase())
                .or_default()
                .push(idx);
        }
        Self {
            updated_at,
            advisories,
            index,
        }
    }

    /// Load the store file. Returns `Ok(None)` when it does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>, EngineError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(EngineError::io(path, e)),
        };
        let file: StoreFile = serde_json::from_str(&content).map_err(|source| EngineError::Json {
            context: path.display().to_string(),
            source,
        })?;
        Ok(Some(Self::from_advisories(file.advisories, file.updated_at)))
    }

    /// Write the store atomically (temp file in the same directory, then rename).
    ///
    /// Creates the parent directory when missing.
    pub fn save(&self, path: &Path) -> Result<(), EngineError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| EngineError::io(parent, e))?;
        }
        let file = StoreFile {
            updated_at: self.updated_at,
            advisories: self.advisories.clone(),
        };
        let body = serde_json::to_vec(&file).map_err(|source| EngineError::Json {
            context: path.display().to_string(),
            source,
        })?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, body).map_err(|e| EngineError::io(&tmp, e))?;
        std::fs::rename(&tmp, path).map_err(|e| EngineError::io(path, e))
    }

    pub fn len(&self) -> usize {
        self.advisories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.advisories.is_empty()
    }

    pub fn updated_at(&self) -> u64 {
        self.updated_at
    }

    /// Whether the store is older than `valid_for`, measured against `now`.
    pub fn is_stale(&self, valid_for: Duration, now: SystemTime) -> bool {
        let now = now
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        now.saturating_sub(self.updated_at) >= valid_for.as_secs()
    }

    /// Advisories affecting `package` at `version`.
    pub fn matching(&self, package: &str, version: &str) -> Vec<&Advisory> {
        self.index
            .get(&package.to_lowercase())
            .map(|indices| {
                indices
                    .iter()
                    .map(|&i| &self.advisories[i])
                    .filter(|a| is_affected(version, &a.affected))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Merge feeds by advisory id; later feeds override earlier ones.
pub fn merge_feeds(feeds: Vec<Vec<Advisory>>) -> Vec<Advisory> {
    let mut merged: BTreeMap<String, Advisory> = BTreeMap::new();
    for feed in feeds {
        for advisory in feed {
            merged.insert(advisory.id.clone(), advisory);
        }
    }
    merged.into_values().collect()
}

/// Seconds since the Unix epoch.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn advisory(id: &str, package: &str, fixed: &str) -> Advisory {
        Advisory {
            id: id.to_owned(),
            package: package.to_owned(),
            severity: "HIGH".to_owned(),
            affected: vec![AffectedRange {
                introduced: None,
                fixed: Some(fixed.to_owned()),
            }],
            description: format!("{id} in {package}"),
        }
    }

    #[test]
    fn test_load_missing_store_is_none() {
        let dir = tempdir().unwrap();
        assert!(VulnStore::load(&store_path(dir.path())).unwrap().is_none());
    }

    #[test]
    fn test_save_then_load_preserves_matching() {
        let dir = tempdir().unwrap();
        let path = store_path(dir.path());
        let store = VulnStore::from_advisories(
            vec![advisory("CVE-2015-7501", "commons-collections", "3.2.2")],
            1_700_000_000,
        );
        store.save(&path).unwrap();
        assert!(!path.with_extension("json.tmp").exists());

        let loaded = VulnStore::load(&path).unwrap().unwrap();
        assert_eq!(loaded.updated_at(), 1_700_000_000);
        assert_eq!(loaded.matching("Commons-Collections", "3.2.1").len(), 1);
        assert!(loaded.matching("commons-collections", "3.2.2").is_empty());
        assert!(loaded.matching("guava", "1.0").is_empty());
    }

    #[test]
    fn test_corrupt_store_is_json_error() {
        let dir = tempdir().unwrap();
        let path = store_path(dir.path());
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            VulnStore::load(&path),
            Err(EngineError::Json { .. })
        ));
    }

    #[test]
    fn test_staleness() {
        let store = VulnStore::from_advisories(Vec::new(), 1_000);
        let now = UNIX_EPOCH + Duration::from_secs(1_000 + 3_600);
        assert!(!store.is_stale(Duration::from_secs(4 * 3_600), now));
        assert!(store.is_stale(Duration::from_secs(3_600), now));
    }

    #[test]
    fn test_merge_later_feed_wins() {
        let base = vec![advisory("CVE-1", "a", "1.0"), advisory("CVE-2", "b", "1.0")];
        let modified = vec![advisory("CVE-2", "b", "2.0")];
        let merged = merge_feeds(vec![base, modified]);
        assert_eq!(merged.len(), 2);
        let cve2 = merged.iter().find(|a| a.id == "CVE-2").unwrap();
        assert_eq!(cve2.affected[0].fixed.as_deref(), Some("2.0"));
    }

    #[test]
    fn test_advisory_without_ranges_matches_every_version() {
        let mut all = advisory("CVE-3", "struts", "1.0");
        all.affected.clear();
        let store = VulnStore::from_advisories(vec![all], 0);
        assert_eq!(store.matching("struts", "2.5.30").len(), 1);
        assert_eq!(store.matching("struts", "0.1").len(), 1);
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = store_path(&dir.path().join("a").join("b"));
        VulnStore::from_advisories(Vec::new(), 0).save(&path).unwrap();
        assert!(path.is_file());
    }
}
