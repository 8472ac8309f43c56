//! The shared, read-only atlas: one store plus one mapping table.

use tracing::info;

use crate::error::AtlasResult;
use crate::mapping::{MappingBuilder, MappingTable, SchemeDef};
use crate::region::Region;
use crate::remap::RemapEngine;
use crate::store::TaxonomyStore;
use crate::traits::IntoRegionIds;

/// A taxonomy store together with the mapping table built over it.
///
/// Readers share it by reference. The table only changes through
/// [`rebuild_mappings`](Self::rebuild_mappings), which needs exclusive access
/// and swaps the new table in only after it was fully built.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "bevy", derive(bevy::prelude::Resource))]
pub struct Atlas {
    store: TaxonomyStore,
    mappings: MappingTable,
}

impl Atlas {
    /// Pair a store with an already built (e.g. loaded) table.
    pub fn new(store: TaxonomyStore, mappings: MappingTable) -> AtlasResult<Self> {
        mappings.ensure_rows(store.len())?;
        Ok(Self { store, mappings })
    }

    /// Build the canonical table for `schemes` and pair it with `store`.
    pub fn rebuild(store: TaxonomyStore, schemes: &[SchemeDef]) -> AtlasResult<Self> {
        let mappings = MappingBuilder::new(&store).build_table(schemes)?;
        Ok(Self { store, mappings })
    }

    /// Recompute the table. On failure the current table is left untouched.
    pub fn rebuild_mappings(&mut self, schemes: &[SchemeDef]) -> AtlasResult<()> {
        let mappings = MappingBuilder::new(&self.store).build_table(schemes)?;
        info!(columns = mappings.len(), "mapping table replaced");
        self.mappings = mappings;
        Ok(())
    }

    #[inline]
    pub fn store(&self) -> &TaxonomyStore {
        &self.store
    }

    #[inline]
    pub fn mappings(&self) -> &MappingTable {
        &self.mappings
    }

    #[inline]
    pub fn remap(&self) -> RemapEngine<'_> {
        RemapEngine::new_unchecked(&self.store, &self.mappings)
    }

    pub fn get(&self, ids: impl IntoRegionIds) -> AtlasResult<Vec<&Region>> {
        self.store.get(ids)
    }

    pub fn ancestors(&self, ids: impl IntoRegionIds) -> AtlasResult<Vec<&Region>> {
        self.store.navigator().ancestors(ids)
    }

    pub fn descendants(&self, ids: impl IntoRegionIds) -> AtlasResult<Vec<&Region>> {
        self.store.navigator().descendants(ids)
    }

    pub fn leaves(&self) -> Vec<&Region> {
        self.store.leaves()
    }

    pub fn into_parts(self) -> (TaxonomyStore, MappingTable) {
        (self.store, self.mappings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::*;
    use crate::error::AtlasError;

    #[test]
    fn new_rejects_mismatched_table() {
        let store = fixture_store();
        let table = MappingTable::new(store.len() + 1);
        assert!(matches!(
            Atlas::new(store, table),
            Err(AtlasError::TableShape { .. })
        ));
    }

    #[test]
    fn failed_rebuild_keeps_previous_table() {
        let mut atlas = Atlas::rebuild(fixture_store(), &fixture_schemes()).unwrap();
        let before = atlas.mappings().clone();

        let err = atlas
            .rebuild_mappings(&[SchemeDef::new("Bad", vec![404])])
            .unwrap_err();
        assert!(matches!(err, AtlasError::SchemeValidation { .. }));
        assert_eq!(atlas.mappings(), &before);

        atlas
            .rebuild_mappings(&[SchemeDef::new("OnlyA", vec![A])])
            .unwrap();
        assert!(atlas.mappings().contains("OnlyA-lr"));
        assert!(!atlas.mappings().contains("Fine"));
    }

    #[test]
    fn delegates_queries() {
        let atlas = Atlas::rebuild(fixture_store(), &fixture_schemes()).unwrap();
        assert_eq!(atlas.descendants(B).unwrap().len(), 2);
        assert_eq!(atlas.ancestors(B).unwrap().len(), 3);
        assert_eq!(atlas.get([A, A]).unwrap().len(), 2);
        assert_eq!(
            atlas.remap().remap(D, "Allen", "Coarse").unwrap(),
            vec![Some(A)]
        );
    }

    #[test]
    fn atlas_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Atlas>();
    }
}
