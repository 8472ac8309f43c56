//! Mapping lock file: the persisted, precomputed mapping table.
//!
//! Stores the table next to fingerprints of the source it was built from, so
//! a later load can tell whether the table still matches `atlas.toml`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use atlas_regions::MappingTable;
use serde::{Deserialize, Serialize};

use crate::fingerprint::{regions_fingerprint, scheme_fingerprint};
use crate::source::AtlasSource;

/// Fingerprint key of the hierarchy itself.
pub const REGIONS_KEY: &str = "regions";

/// Persisted mapping table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingLock {
    /// RFC 3339 timestamp of the build
    pub generated_at: String,
    /// Unlateralized region count of the source
    pub region_count: usize,
    /// `"regions"` plus one entry per scheme
    pub fingerprints: BTreeMap<String, String>,
    pub mappings: MappingTable,
}

/// What changed between a lock and a source.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LockDiff {
    /// Keys present in the source but not in the lock
    pub added: Vec<String>,
    /// Keys present in the lock but not in the source
    pub removed: Vec<String>,
    /// Keys whose fingerprint differs
    pub changed: Vec<String>,
}

impl LockDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

impl MappingLock {
    /// Lock for a freshly built table.
    pub fn new(source: &AtlasSource, mappings: MappingTable) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            region_count: source.len(),
            fingerprints: Self::fingerprints_of(source),
            mappings,
        }
    }

    /// Read from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LockFileError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            LockFileError::Io(format!("Failed to read {}: {}", path.as_ref().display(), e))
        })?;
        Self::from_str(&content)
    }

    pub fn from_str(content: &str) -> Result<Self, LockFileError> {
        toml::from_str(content).map_err(|e| LockFileError::Parse(e.to_string()))
    }

    /// Write as TOML.
    ///
    /// The content goes to a sibling `.tmp` file that is then renamed over
    /// `path`, so an interrupted write leaves the previous lock in place.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), LockFileError> {
        let path = path.as_ref();
        let content =
            toml::to_string(self).map_err(|e| LockFileError::Serialize(e.to_string()))?;

        let tmp = Self::staging_path(path);
        std::fs::write(&tmp, content).map_err(|e| {
            LockFileError::Io(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        std::fs::rename(&tmp, path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            LockFileError::Io(format!("Failed to replace {}: {}", path.display(), e))
        })
    }

    fn staging_path(path: &Path) -> PathBuf {
        let mut name = path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        path.with_file_name(name)
    }

    /// Compare the recorded fingerprints with those of `source`.
    pub fn diff(&self, source: &AtlasSource) -> LockDiff {
        let current = Self::fingerprints_of(source);
        let mut diff = LockDiff::default();
        for (key, value) in &current {
            match self.fingerprints.get(key) {
                None => diff.added.push(key.clone()),
                Some(old) if old != value => diff.changed.push(key.clone()),
                Some(_) => {}
            }
        }
        for key in self.fingerprints.keys() {
            if !current.contains_key(key) {
                diff.removed.push(key.clone());
            }
        }
        diff
    }

    /// Whether the stored table was built from exactly this source.
    pub fn is_fresh_for(&self, source: &AtlasSource) -> bool {
        self.region_count == source.len() && self.diff(source).is_empty()
    }

    fn fingerprints_of(source: &AtlasSource) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        out.insert(REGIONS_KEY.to_string(), regions_fingerprint(&source.regions));
        for scheme in &source.schemes {
            out.insert(scheme.name.clone(), scheme_fingerprint(scheme));
        }
        out
    }
}

/// Errors reading or writing the lock file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LockFileError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Serialize error: {0}")]
    Serialize(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_regions::{MappingBuilder, TaxonomyStore};

    const SOURCE: &str = r#"
[[regions]]
id = 0
name = "void"
acronym = "void"
depth = 0

[[regions]]
id = 997
name = "root"
acronym = "root"
depth = 0

[[regions]]
id = 8
name = "grey"
acronym = "grey"
depth = 1
parent_id = 997

[schemes.Cosmos]
members = [8]
"#;

    fn lock_for(source: &AtlasSource) -> MappingLock {
        let store = TaxonomyStore::from_raw(&source.regions).unwrap();
        let table = MappingBuilder::new(&store)
            .build_table(&source.schemes)
            .unwrap();
        MappingLock::new(source, table)
    }

    #[test]
    fn fresh_lock_matches_source() {
        let source = AtlasSource::from_str(SOURCE).unwrap();
        let lock = lock_for(&source);
        assert!(lock.is_fresh_for(&source));
        assert_eq!(lock.region_count, 3);
        assert!(lock.fingerprints.contains_key(REGIONS_KEY));
        assert!(lock.fingerprints.contains_key("Cosmos"));
        assert!(chrono::DateTime::parse_from_rfc3339(&lock.generated_at).is_ok());
    }

    #[test]
    fn toml_round_trip() {
        let source = AtlasSource::from_str(SOURCE).unwrap();
        let lock = lock_for(&source);
        let text = toml::to_string(&lock).unwrap();
        let back = MappingLock::from_str(&text).unwrap();
        assert_eq!(back, lock);
    }

    #[test]
    fn diff_reports_scheme_changes() {
        let source = AtlasSource::from_str(SOURCE).unwrap();
        let lock = lock_for(&source);

        let changed = SOURCE.replace("members = [8]", "members = [997]");
        let changed = AtlasSource::from_str(&changed).unwrap();
        let diff = lock.diff(&changed);
        assert_eq!(diff.changed, vec!["Cosmos".to_string()]);
        assert!(!lock.is_fresh_for(&changed));

        let renamed = SOURCE.replace("schemes.Cosmos", "schemes.Beryl");
        let renamed = AtlasSource::from_str(&renamed).unwrap();
        let diff = lock.diff(&renamed);
        assert_eq!(diff.added, vec!["Beryl".to_string()]);
        assert_eq!(diff.removed, vec!["Cosmos".to_string()]);
    }

    #[test]
    fn failed_write_keeps_previous_lock() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("atlas.lock.toml");
        let source = AtlasSource::from_str(SOURCE).unwrap();
        let lock = lock_for(&source);
        lock.write_to_file(&path).unwrap();
        assert!(!dir.path().join("atlas.lock.toml.tmp").exists());

        // A directory in the staging slot makes the next write fail
        std::fs::create_dir(dir.path().join("atlas.lock.toml.tmp")).unwrap();
        let mut newer = lock.clone();
        newer.region_count += 1;
        assert!(matches!(
            newer.write_to_file(&path),
            Err(LockFileError::Io(_))
        ));
        assert_eq!(MappingLock::from_file(&path).unwrap(), lock);
    }

    #[test]
    fn corrupt_lock_is_a_parse_error() {
        assert!(matches!(
            MappingLock::from_str("generated_at = 5"),
            Err(LockFileError::Parse(_))
        ));
    }
}
