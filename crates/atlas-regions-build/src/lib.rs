//! Offline tooling for atlas-regions.
//!
//! This crate provides tools for:
//! - Parsing `atlas.toml` hierarchy sources (regions + coarse schemes)
//! - Managing `atlas.lock.toml` lock files holding the precomputed mapping table
//! - Rebuilding the mapping table when the source changes
//!
//! # Usage
//!
//! ```ignore
//! let atlas = atlas_regions_build::load_or_rebuild("atlas.toml", "atlas.lock.toml")?;
//! let beryl = atlas.remap().remap(ids, "Allen", "Beryl")?;
//! ```
//!
//! # Lock File Mechanism
//!
//! Building the mapping table walks one subtree per scheme member, so it is
//! done once and persisted:
//!
//! - First load: builds the table and writes `atlas.lock.toml`
//! - Subsequent loads: reuses the table when the source fingerprints match
//! - Mismatch (regions or scheme members changed): **error** (default) or
//!   **rebuild** (with `on_stale = "rebuild"`)
//!
//! To force a rebuild, delete the lock file.

mod fingerprint;
mod lock;
mod source;

pub use fingerprint::{fnv1a_64, regions_fingerprint, scheme_fingerprint};
pub use lock::{LockDiff, LockFileError, MappingLock, REGIONS_KEY};
pub use source::{AtlasSource, OnStale, SourceError};

use std::path::Path;

use atlas_regions::{codec, Atlas, AtlasError, MappingTable, TaxonomyStore};
use tracing::{info, warn};

/// Main entry point: load an atlas, reusing the lock file when it is fresh.
///
/// The lock file path is derived from the source path
/// (`atlas.toml` → `atlas.lock.toml`).
///
/// # Errors
///
/// Returns an error if:
/// - the source cannot be read, parsed or lateralized
/// - the lock is stale and `on_stale = "error"`
/// - a scheme references unknown regions
/// - the lock file cannot be written
pub fn load(source_path: impl AsRef<Path>) -> Result<Atlas, BuildError> {
    let source_path = source_path.as_ref();
    let lock_path = source_path.with_extension("lock.toml");
    load_or_rebuild(source_path, &lock_path)
}

/// Load with an explicit lock file path.
pub fn load_or_rebuild(
    source_path: impl AsRef<Path>,
    lock_path: impl AsRef<Path>,
) -> Result<Atlas, BuildError> {
    let lock_path = lock_path.as_ref();

    // 1. Parse atlas.toml and lateralize
    let source = AtlasSource::from_file(source_path)?;
    let store = TaxonomyStore::from_raw(&source.regions)?;

    // 2. Reuse a fresh lock
    if lock_path.exists() {
        let lock = MappingLock::from_file(lock_path)?;
        let diff = lock.diff(&source);
        if lock.is_fresh_for(&source) {
            info!(path = %lock_path.display(), "reusing mapping lock");
            return Ok(Atlas::new(store, lock.mappings)?);
        }
        match source.on_stale {
            OnStale::Error => return Err(BuildError::StaleLock(format_stale_error(&diff))),
            OnStale::Rebuild => {
                warn!(
                    added = ?diff.added,
                    removed = ?diff.removed,
                    changed = ?diff.changed,
                    "mapping lock is stale, rebuilding"
                );
            }
        }
    }

    // 3. Rebuild and persist; the lock is only written after a full build
    let atlas = Atlas::rebuild(store, &source.schemes)?;
    MappingLock::new(&source, atlas.mappings().clone()).write_to_file(lock_path)?;
    info!(path = %lock_path.display(), "mapping lock written");
    Ok(atlas)
}

/// Write a mapping table in the binary column format.
pub fn write_binary(table: &MappingTable, path: impl AsRef<Path>) -> Result<(), BuildError> {
    std::fs::write(path, codec::encode(table)?)?;
    Ok(())
}

/// Read a mapping table written by [`write_binary`].
pub fn read_binary(path: impl AsRef<Path>) -> Result<MappingTable, BuildError> {
    let bytes = std::fs::read(path)?;
    Ok(codec::decode(&bytes)?)
}

fn format_stale_error(diff: &LockDiff) -> String {
    let mut msg = String::new();
    msg.push_str("atlas-regions: Mapping lock is stale!\n\n");
    for (label, keys) in [
        ("Added in atlas.toml", &diff.added),
        ("Missing in atlas.toml (existed in lock)", &diff.removed),
        ("Changed since the lock was built", &diff.changed),
    ] {
        if keys.is_empty() {
            continue;
        }
        msg.push_str(&format!("  {}:\n", label));
        for key in keys {
            msg.push_str(&format!("    - {}\n", key));
        }
    }
    msg.push_str("\n  To fix:\n");
    msg.push_str("    1. Set `on_stale = \"rebuild\"` in atlas.toml, OR\n");
    msg.push_str("    2. Delete atlas.lock.toml to regenerate\n");
    msg
}

/// Errors that can occur while loading or rebuilding.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
    #[error("Lock file error: {0}")]
    Lock(#[from] LockFileError),
    #[error("{0}")]
    StaleLock(String),
    #[error("Atlas error: {0}")]
    Atlas(#[from] AtlasError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
