//! Mapping construction: routes every region to its representative in a scheme.
//!
//! A mapping is a column of store length: `mapping[p]` is the store position
//! of the representative of position `p`. Each region ends up on the deepest
//! scheme member that contains it; regions outside every member fall back to
//! the root and void always stays void.
//!
//! Building a table walks one descendant closure per scheme member, so it is an
//! offline step. The normal path loads an already built [`MappingTable`].

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AtlasError, AtlasResult};
use crate::region::RegionId;
use crate::store::TaxonomyStore;

/// Full, unsigned scheme: every region maps to its unlateralized self.
pub const FULL_SCHEME: &str = "Allen";

/// Suffix naming the lateralized variant of a scheme.
pub const LATERAL_SUFFIX: &str = "-lr";

/// Name of the lateralized variant of `scheme`.
pub fn lateral_name(scheme: &str) -> String {
    format!("{scheme}{LATERAL_SUFFIX}")
}

/// Whether `scheme` already names a lateralized variant.
#[inline]
pub fn is_lateral(scheme: &str) -> bool {
    scheme.contains(LATERAL_SUFFIX)
}

/// A named set of canonical region ids.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeDef {
    pub name: String,
    pub members: Vec<RegionId>,
}

impl SchemeDef {
    pub fn new(name: impl Into<String>, members: Vec<RegionId>) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }
}

/// Builds mapping columns over one store.
#[derive(Clone, Copy, Debug)]
pub struct MappingBuilder<'a> {
    store: &'a TaxonomyStore,
}

impl<'a> MappingBuilder<'a> {
    pub fn new(store: &'a TaxonomyStore) -> Self {
        Self { store }
    }

    /// Build the mapping column of one scheme.
    ///
    /// With `lateralize == false` both hemisphere copies share the
    /// representative of the unsigned region.
    pub fn build(&self, scheme: &SchemeDef, lateralize: bool) -> AtlasResult<Vec<usize>> {
        let store = self.store;

        // 1. Symmetrize
        let members: BTreeSet<RegionId> = scheme
            .members
            .iter()
            .flat_map(|&id| [id, -id])
            .collect();

        // 2. Validate
        let missing: Vec<RegionId> = members
            .iter()
            .copied()
            .filter(|&id| !store.contains_id(id))
            .collect();
        if !missing.is_empty() {
            return Err(AtlasError::SchemeValidation {
                scheme: scheme.name.clone(),
                missing,
            });
        }

        // 3. Unassigned regions default to root
        let mut mapind = vec![store.root_position(); store.len()];

        // 4. Members map to themselves
        let mut member_pos: Vec<usize> = store
            .regions()
            .iter()
            .enumerate()
            .filter(|(_, r)| members.contains(&r.id))
            .map(|(p, _)| p)
            .collect();
        for &p in &member_pos {
            mapind[p] = p;
        }

        // 5. Shallow members first; deeper members overwrite their own subtrees
        member_pos.sort_by_key(|&p| store.regions()[p].level);
        let nav = store.navigator();
        for &m in &member_pos {
            for d in nav.descendant_positions(m) {
                mapind[d] = m;
            }
        }

        // 6. Void stays void
        if let Some(first) = mapind.first_mut() {
            *first = store.void_position();
        }

        // 7. Delateralize through the unsigned copy
        if !lateralize {
            mapind = store
                .regions()
                .iter()
                .enumerate()
                .map(|(p, r)| {
                    let unsigned = store.position_of(r.id.abs()).unwrap_or(p);
                    mapind[unsigned]
                })
                .collect();
        }

        debug!(
            scheme = %scheme.name,
            members = member_pos.len(),
            lateralize,
            "built mapping"
        );
        Ok(mapind)
    }

    /// Build the canonical table: the full scheme, its lateralized identity,
    /// and an unsigned plus lateralized column for each coarse scheme.
    ///
    /// Fails on the first invalid scheme; no partial table is returned.
    pub fn build_table(&self, schemes: &[SchemeDef]) -> AtlasResult<MappingTable> {
        let start = Instant::now();
        let n = self.store.len();
        let mut table = MappingTable::new(n);

        let unsigned: BTreeSet<RegionId> = self.store.ids().map(RegionId::abs).collect();
        let full = SchemeDef::new(FULL_SCHEME, unsigned.into_iter().collect());
        table.insert(FULL_SCHEME, self.build(&full, false)?)?;
        table.insert(lateral_name(FULL_SCHEME), (0..n).collect())?;

        for scheme in schemes {
            let t = Instant::now();
            table.insert(scheme.name.clone(), self.build(scheme, false)?)?;
            table.insert(lateral_name(&scheme.name), self.build(scheme, true)?)?;
            info!(
                scheme = %scheme.name,
                members = scheme.members.len(),
                elapsed_ms = t.elapsed().as_millis() as u64,
                "mapping built"
            );
        }

        info!(
            columns = table.len(),
            rows = n,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "mapping table built"
        );
        Ok(table)
    }
}

/// Named mapping columns, all of store length.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MappingColumns")]
pub struct MappingTable {
    rows: usize,
    columns: BTreeMap<String, Vec<usize>>,
}

#[derive(Deserialize)]
struct MappingColumns {
    rows: usize,
    columns: BTreeMap<String, Vec<usize>>,
}

impl TryFrom<MappingColumns> for MappingTable {
    type Error = AtlasError;

    fn try_from(raw: MappingColumns) -> Result<Self, Self::Error> {
        MappingTable::from_columns(raw.rows, raw.columns)
    }
}

impl MappingTable {
    /// Empty table for a store of `rows` positions.
    pub fn new(rows: usize) -> Self {
        Self {
            rows,
            columns: BTreeMap::new(),
        }
    }

    /// Validated table from already built columns.
    pub fn from_columns(
        rows: usize,
        columns: impl IntoIterator<Item = (String, Vec<usize>)>,
    ) -> AtlasResult<Self> {
        let mut table = Self::new(rows);
        for (name, column) in columns {
            table.insert(name, column)?;
        }
        Ok(table)
    }

    /// Add or replace a column. Returns the replaced column, if any.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        column: Vec<usize>,
    ) -> AtlasResult<Option<Vec<usize>>> {
        let name = name.into();
        if column.len() != self.rows {
            return Err(AtlasError::TableShape {
                scheme: name,
                expected: self.rows,
                actual: column.len(),
            });
        }
        if let Some(&position) = column.iter().find(|&&p| p >= self.rows) {
            return Err(AtlasError::PositionOutOfRange {
                scheme: name,
                position,
                len: self.rows,
            });
        }
        if column.first().is_some_and(|&p| p != 0) {
            return Err(AtlasError::VoidNotPinned(name));
        }
        Ok(self.columns.insert(name, column))
    }

    #[inline]
    pub fn get(&self, scheme: &str) -> Option<&[usize]> {
        self.columns.get(scheme).map(Vec::as_slice)
    }

    /// Column for `scheme`, or [`AtlasError::UnknownScheme`].
    pub fn column(&self, scheme: &str) -> AtlasResult<&[usize]> {
        self.get(scheme)
            .ok_or_else(|| AtlasError::UnknownScheme(scheme.to_string()))
    }

    #[inline]
    pub fn contains(&self, scheme: &str) -> bool {
        self.columns.contains_key(scheme)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.keys().map(String::as_str)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &[usize])> + '_ {
        self.columns.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of positions per column.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Fails with [`AtlasError::TableShape`] unless every column has `expected`
    /// positions.
    pub fn ensure_rows(&self, expected: usize) -> AtlasResult<()> {
        if self.rows == expected {
            return Ok(());
        }
        Err(AtlasError::TableShape {
            scheme: self.names().next().unwrap_or_default().to_string(),
            expected,
            actual: self.rows,
        })
    }

    /// Number of columns.
    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::*;
    use crate::region::{RawRegion, VOID_ID};

    fn mapped_ids(store: &TaxonomyStore, column: &[usize]) -> Vec<(RegionId, RegionId)> {
        store
            .regions()
            .iter()
            .zip(column)
            .map(|(r, &m)| (r.id, store.regions()[m].id))
            .collect()
    }

    fn target_of(store: &TaxonomyStore, column: &[usize], id: RegionId) -> RegionId {
        let p = store.position_of(id).unwrap();
        store.regions()[column[p]].id
    }

    #[test]
    fn single_member_claims_its_subtree() {
        let store = fixture_store();
        let col = MappingBuilder::new(&store)
            .build(&SchemeDef::new("OnlyA", vec![A]), false)
            .unwrap();
        for id in [A, B, C, D] {
            assert_eq!(target_of(&store, &col, id), A);
        }
        assert_eq!(target_of(&store, &col, ROOT), ROOT);
        assert_eq!(target_of(&store, &col, E), ROOT);
        assert_eq!(col[0], 0);
    }

    #[test]
    fn deepest_enclosing_member_wins() {
        let store = fixture_store();
        let col = MappingBuilder::new(&store)
            .build(&SchemeDef::new("Nested", vec![B, A]), true)
            .unwrap();
        assert_eq!(target_of(&store, &col, D), B);
        assert_eq!(target_of(&store, &col, B), B);
        assert_eq!(target_of(&store, &col, C), A);
        assert_eq!(target_of(&store, &col, -D), -B);
        assert_eq!(target_of(&store, &col, -C), -A);
    }

    #[test]
    fn deeper_member_wins_regardless_of_row_order() {
        // Descendants listed before their ancestors
        let rows = vec![
            RawRegion::new(VOID_ID, "void", "void", 0, None),
            RawRegion::new(ROOT, "root", "root", 0, None),
            RawRegion::new(B, "Area B", "B", 2, Some(A)),
            RawRegion::new(D, "Area D", "D", 3, Some(B)),
            RawRegion::new(A, "Area A", "A", 1, Some(ROOT)),
            RawRegion::new(C, "Area C", "C", 2, Some(A)),
        ];
        let store = TaxonomyStore::from_raw(&rows).unwrap();
        let col = MappingBuilder::new(&store)
            .build(&SchemeDef::new("Nested", vec![A, B]), true)
            .unwrap();

        assert_eq!(target_of(&store, &col, D), B);
        assert_eq!(target_of(&store, &col, B), B);
        assert_eq!(target_of(&store, &col, C), A);
        assert_eq!(target_of(&store, &col, -D), -B);
        assert_eq!(target_of(&store, &col, -C), -A);
    }

    #[test]
    fn unsigned_mapping_drops_hemisphere() {
        let store = fixture_store();
        let col = MappingBuilder::new(&store)
            .build(&SchemeDef::new("OnlyA", vec![A]), false)
            .unwrap();
        assert_eq!(target_of(&store, &col, -D), A);
        assert_eq!(target_of(&store, &col, -A), A);
        assert!(mapped_ids(&store, &col).iter().all(|&(_, t)| t >= 0));
    }

    #[test]
    fn lateralized_mapping_keeps_hemisphere() {
        let store = fixture_store();
        let col = MappingBuilder::new(&store)
            .build(&SchemeDef::new("OnlyA", vec![A]), true)
            .unwrap();
        assert_eq!(target_of(&store, &col, -D), -A);
        assert_eq!(target_of(&store, &col, D), A);
    }

    #[test]
    fn void_is_pinned_even_when_listed() {
        let store = fixture_store();
        let col = MappingBuilder::new(&store)
            .build(&SchemeDef::new("WithVoid", vec![VOID_ID, ROOT]), true)
            .unwrap();
        assert_eq!(col[0], 0);
        assert_eq!(target_of(&store, &col, D), ROOT);
        assert_eq!(target_of(&store, &col, -D), -ROOT);
    }

    #[test]
    fn missing_members_fail_every_time() {
        let store = fixture_store();
        let builder = MappingBuilder::new(&store);
        let scheme = SchemeDef::new("Broken", vec![A, 404, 505]);
        let first = builder.build(&scheme, false).unwrap_err();
        let second = builder.build(&scheme, false).unwrap_err();
        assert_eq!(first, second);
        assert_eq!(
            first,
            AtlasError::SchemeValidation {
                scheme: "Broken".into(),
                missing: vec![-505, -404, 404, 505],
            }
        );
    }

    #[test]
    fn canonical_table_has_all_variants() {
        let store = fixture_store();
        let table = fixture_table(&store);
        let names: Vec<&str> = table.names().collect();
        assert_eq!(
            names,
            vec!["Allen", "Allen-lr", "Coarse", "Coarse-lr", "Fine", "Fine-lr"]
        );
        assert_eq!(table.rows(), store.len());

        let allen_lr = table.get("Allen-lr").unwrap();
        assert!(allen_lr.iter().enumerate().all(|(p, &m)| p == m));

        let allen = table.get("Allen").unwrap();
        for r in store.regions() {
            assert_eq!(target_of(&store, allen, r.id), r.id.abs());
        }

        let fine = table.get("Fine").unwrap();
        assert_eq!(target_of(&store, fine, D), B);
        assert_eq!(target_of(&store, fine, A), ROOT);
        let coarse = table.get("Coarse-lr").unwrap();
        assert_eq!(target_of(&store, coarse, -D), -A);
    }

    #[test]
    fn table_build_is_all_or_nothing() {
        let store = fixture_store();
        let schemes = vec![
            SchemeDef::new("Good", vec![A]),
            SchemeDef::new("Bad", vec![404]),
        ];
        let err = MappingBuilder::new(&store).build_table(&schemes).unwrap_err();
        assert!(matches!(err, AtlasError::SchemeValidation { ref scheme, .. } if scheme == "Bad"));
    }

    #[test]
    fn table_rejects_bad_columns() {
        let mut table = MappingTable::new(3);
        assert!(matches!(
            table.insert("short", vec![0, 1]),
            Err(AtlasError::TableShape { expected: 3, actual: 2, .. })
        ));
        assert!(matches!(
            table.insert("far", vec![0, 1, 9]),
            Err(AtlasError::PositionOutOfRange { position: 9, .. })
        ));
        assert_eq!(
            table.insert("void", vec![1, 1, 1]),
            Err(AtlasError::VoidNotPinned("void".into()))
        );
        assert_eq!(table.insert("ok", vec![0, 1, 1]), Ok(None));
        assert_eq!(table.column("nope"), Err(AtlasError::UnknownScheme("nope".into())));
    }

    #[test]
    fn table_json_round_trip_validates() {
        let store = fixture_store();
        let table = fixture_table(&store);
        let json = serde_json::to_string(&table).unwrap();
        let back: MappingTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);

        let bad = r#"{"rows":2,"columns":{"x":[0,5]}}"#;
        assert!(serde_json::from_str::<MappingTable>(bad).is_err());
    }
}
