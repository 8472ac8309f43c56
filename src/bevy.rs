//! Bevy integration for the region atlas.
//!
//! Provides:
//! - `AtlasPlugin`: inserts a built [`Atlas`] as a read-only Resource
//! - `RegionLabels`: per-entity set of region ids with hierarchy checks
//!
//! # Example
//!
//! ```ignore
//! use bevy::prelude::*;
//! use atlas_regions::bevy::*;
//!
//! fn main() {
//!     let atlas = atlas_regions_build::load_or_rebuild("atlas.toml", "atlas.lock.toml")
//!         .expect("Failed to load atlas");
//!     App::new()
//!         .add_plugins(AtlasPlugin::new(atlas))
//!         .add_systems(Update, count_cortex)
//!         .run();
//! }
//!
//! fn count_cortex(atlas: Res<Atlas>, query: Query<&RegionLabels>) {
//!     let n = query
//!         .iter()
//!         .filter(|l| l.has_descendant_of(&atlas, 688).unwrap_or(false))
//!         .count();
//!     info!("{n} electrodes in cortex");
//! }
//! ```

use bevy::prelude::*;
use std::collections::HashSet;

use crate::atlas::Atlas;
use crate::error::AtlasResult;
use crate::region::RegionId;

// =============================================================================
// Plugin
// =============================================================================

/// Bevy plugin inserting an [`Atlas`] resource.
///
/// The atlas is immutable once inserted; systems read it through `Res<Atlas>`.
pub struct AtlasPlugin {
    atlas: Atlas,
}

impl AtlasPlugin {
    pub fn new(atlas: Atlas) -> Self {
        Self { atlas }
    }
}

impl Plugin for AtlasPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.atlas.clone());
    }
}

// =============================================================================
// RegionLabels Component
// =============================================================================

/// Region ids attached to an entity (e.g. the regions an electrode crosses).
#[derive(Component, Clone, Debug, Default, PartialEq, Eq)]
pub struct RegionLabels {
    ids: HashSet<RegionId>,
}

impl RegionLabels {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: add a region and return self.
    #[inline]
    pub fn with(mut self, id: RegionId) -> Self {
        self.ids.insert(id);
        self
    }

    /// Returns `true` if the region was newly inserted.
    #[inline]
    pub fn insert(&mut self, id: RegionId) -> bool {
        self.ids.insert(id)
    }

    #[inline]
    pub fn remove(&mut self, id: RegionId) -> bool {
        self.ids.remove(&id)
    }

    #[inline]
    pub fn has(&self, id: RegionId) -> bool {
        self.ids.contains(&id)
    }

    /// Whether any label lies in the subtree of `ancestor` (itself included).
    ///
    /// An unknown `ancestor` is an error only under a strict lookup policy.
    pub fn has_descendant_of(&self, atlas: &Atlas, ancestor: RegionId) -> AtlasResult<bool> {
        let subtree = atlas.descendants(ancestor)?;
        Ok(subtree.iter().any(|r| self.ids.contains(&r.id)))
    }

    /// Labels translated into `scheme`.
    ///
    /// Labels unknown to the atlas are skipped when lenient.
    pub fn remapped(&self, atlas: &Atlas, scheme: &str) -> AtlasResult<Self> {
        let ids: Vec<RegionId> = self.ids.iter().copied().collect();
        let mapped = atlas.remap().atlas_id_to_atlas_id(ids, scheme)?;
        Ok(mapped.into_iter().flatten().collect())
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.ids.iter().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<RegionId> for RegionLabels {
    fn from_iter<T: IntoIterator<Item = RegionId>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl Extend<RegionId> for RegionLabels {
    fn extend<T: IntoIterator<Item = RegionId>>(&mut self, iter: T) {
        self.ids.extend(iter);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AtlasError;
    use crate::fixture::*;
    use crate::store::{LookupPolicy, TaxonomyStore};

    fn atlas() -> Atlas {
        Atlas::rebuild(fixture_store(), &fixture_schemes()).unwrap()
    }

    #[test]
    fn labels_builder_and_membership() {
        let labels = RegionLabels::new().with(A).with(D);
        assert_eq!(labels.len(), 2);
        assert!(labels.has(D));
        assert!(!labels.has(B));
    }

    #[test]
    fn labels_subtree_check() {
        let atlas = atlas();
        let labels: RegionLabels = [D].into_iter().collect();
        assert!(labels.has_descendant_of(&atlas, A).unwrap());
        assert!(labels.has_descendant_of(&atlas, B).unwrap());
        assert!(!labels.has_descendant_of(&atlas, C).unwrap());
        assert!(!labels.has_descendant_of(&atlas, -A).unwrap());
    }

    #[test]
    fn labels_remap_to_coarse_scheme() {
        let atlas = atlas();
        let labels = RegionLabels::new().with(D).with(C).with(-B);
        let coarse = labels.remapped(&atlas, "Coarse-lr").unwrap();
        let mut got: Vec<RegionId> = coarse.iter().collect();
        got.sort();
        assert_eq!(got, vec![-A, A]);
    }

    #[test]
    fn labels_report_lookup_errors() {
        let atlas = atlas();
        let labels = RegionLabels::new().with(D).with(C);
        assert_eq!(
            labels.remapped(&atlas, "Nope"),
            Err(AtlasError::UnknownScheme("Nope".into()))
        );
        assert!(!labels.has_descendant_of(&atlas, 404).unwrap());

        let strict = Atlas::rebuild(
            TaxonomyStore::from_raw_with_policy(&fixture_rows(), LookupPolicy::Strict).unwrap(),
            &fixture_schemes(),
        )
        .unwrap();
        assert_eq!(
            labels.has_descendant_of(&strict, 404),
            Err(AtlasError::UnknownId(404))
        );
    }

    #[test]
    fn plugin_inserts_resource() {
        let mut app = App::new();
        app.add_plugins(AtlasPlugin::new(atlas()));
        assert!(app.world().contains_resource::<Atlas>());
    }
}
