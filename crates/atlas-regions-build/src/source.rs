//! TOML hierarchy source parser for atlas.toml.

use std::collections::BTreeMap;
use std::path::Path;

use atlas_regions::{is_lateral, RawRegion, RegionId, SchemeDef, FULL_SCHEME};
use serde::Deserialize;

/// Behavior when the mapping lock no longer matches the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnStale {
    /// Refuse to load (default, safest)
    #[default]
    Error,
    /// Recompute the mapping table and rewrite the lock
    Rebuild,
}

/// Parsed hierarchy source.
#[derive(Debug, Clone)]
pub struct AtlasSource {
    /// Behavior when the lock is stale
    pub on_stale: OnStale,
    /// Unlateralized rows, void first
    pub regions: Vec<RawRegion>,
    /// Coarse schemes, ordered by name
    pub schemes: Vec<SchemeDef>,
}

/// Raw TOML structure.
#[derive(Debug, Deserialize)]
struct RawAtlasSource {
    /// "error" (default) or "rebuild"
    on_stale: Option<String>,
    #[serde(default)]
    regions: Vec<RawRegion>,
    #[serde(default)]
    schemes: BTreeMap<String, RawScheme>,
}

#[derive(Debug, Deserialize)]
struct RawScheme {
    members: Vec<RegionId>,
}

impl AtlasSource {
    /// Parse from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            SourceError::Io(format!("Failed to read {}: {}", path.as_ref().display(), e))
        })?;
        Self::from_str(&content)
    }

    /// Parse from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, SourceError> {
        let raw: RawAtlasSource =
            toml::from_str(content).map_err(|e| SourceError::Parse(e.to_string()))?;

        let on_stale = match raw.on_stale.as_deref() {
            None | Some("error") => OnStale::Error,
            Some("rebuild") => OnStale::Rebuild,
            Some(other) => {
                return Err(SourceError::Validation(format!(
                    "Invalid on_stale value '{}': expected 'error' or 'rebuild'",
                    other
                )));
            }
        };

        if raw.regions.is_empty() {
            return Err(SourceError::Validation("No regions defined".into()));
        }

        let schemes = Self::validate_schemes(raw.schemes)?;

        Ok(Self {
            on_stale,
            regions: raw.regions,
            schemes,
        })
    }

    fn validate_schemes(
        raw: BTreeMap<String, RawScheme>,
    ) -> Result<Vec<SchemeDef>, SourceError> {
        let mut schemes = Vec::with_capacity(raw.len());
        for (name, scheme) in raw {
            if name == FULL_SCHEME {
                return Err(SourceError::Validation(format!(
                    "Scheme name '{}' is reserved for the full scheme",
                    name
                )));
            }
            if is_lateral(&name) {
                return Err(SourceError::Validation(format!(
                    "Invalid scheme name '{}': lateralized variants are generated",
                    name
                )));
            }
            if scheme.members.is_empty() {
                return Err(SourceError::Validation(format!(
                    "Scheme '{}' has no members",
                    name
                )));
            }
            schemes.push(SchemeDef::new(name, scheme.members));
        }
        Ok(schemes)
    }

    /// Number of unlateralized regions.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn scheme(&self, name: &str) -> Option<&SchemeDef> {
        self.schemes.iter().find(|s| s.name == name)
    }
}

/// Errors during source parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Validation error: {0}")]
    Validation(String),
}
