//! Identifier translation between mapping schemes.
//!
//! Every query follows the same two steps:
//!
//! 1. find the first position whose value, seen through the **source**
//!    mapping, equals the query;
//! 2. read the **target** mapping at that position and project the row to
//!    an id or an acronym.
//!
//! A query that matches nothing yields `None` under
//! [`LookupPolicy::Lenient`] and [`AtlasError::NotFound`] under
//! [`LookupPolicy::Strict`].

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::hash::Hash;

use tracing::debug;

use crate::error::{AtlasError, AtlasResult};
use crate::hemisphere::{Hemisphere, Lateral};
use crate::mapping::{MappingTable, is_lateral, lateral_name};
use crate::region::{Region, RegionId};
use crate::store::{LookupPolicy, TaxonomyStore};
use crate::traits::{IntoAcronyms, IntoRegionIds};

/// Resolve the scheme to query for a hemisphere-filtered lookup.
///
/// A requested hemisphere switches an unsigned scheme to its lateralized
/// variant; names that are already lateralized are kept.
pub fn infer_scheme(scheme: &str, hemisphere: Option<Hemisphere>) -> String {
    if is_lateral(scheme) || hemisphere.is_none() {
        scheme.to_string()
    } else {
        lateral_name(scheme)
    }
}

/// Read-only translator over a store and its mapping table.
#[derive(Clone, Copy, Debug)]
pub struct RemapEngine<'a> {
    store: &'a TaxonomyStore,
    mappings: &'a MappingTable,
}

impl<'a> RemapEngine<'a> {
    /// Fails with [`AtlasError::TableShape`] when the table was not built
    /// for this store.
    pub fn new(store: &'a TaxonomyStore, mappings: &'a MappingTable) -> AtlasResult<Self> {
        mappings.ensure_rows(store.len())?;
        Ok(Self { store, mappings })
    }

    /// For pairs already checked by [`Atlas`](crate::Atlas).
    pub(crate) fn new_unchecked(store: &'a TaxonomyStore, mappings: &'a MappingTable) -> Self {
        Self { store, mappings }
    }

    /// Alias of [`id_to_id`](Self::id_to_id).
    pub fn remap(
        &self,
        ids: impl IntoRegionIds,
        source: &str,
        target: &str,
    ) -> AtlasResult<Vec<Option<RegionId>>> {
        self.id_to_id(ids, source, target)
    }

    pub fn id_to_id(
        &self,
        ids: impl IntoRegionIds,
        source: &str,
        target: &str,
    ) -> AtlasResult<Vec<Option<RegionId>>> {
        let ids = ids.into_region_ids();
        let found = self.locate(self.through(source)?, &ids, |r| r.id)?;
        self.project(found, target, |r| r.id)
    }

    pub fn id_to_acronym(
        &self,
        ids: impl IntoRegionIds,
        source: &str,
        target: &str,
    ) -> AtlasResult<Vec<Option<&'a str>>> {
        let ids = ids.into_region_ids();
        let found = self.locate(self.through(source)?, &ids, |r| r.id)?;
        self.project(found, target, |r| r.acronym.as_str())
    }

    pub fn acronym_to_acronym(
        &self,
        acronyms: impl IntoAcronyms,
        source: &str,
        target: &str,
    ) -> AtlasResult<Vec<Option<&'a str>>> {
        let acronyms = acronyms.into_acronyms();
        let found = self.locate_acronyms(self.through(source)?, &acronyms)?;
        self.project(found, target, |r| r.acronym.as_str())
    }

    pub fn acronym_to_id(
        &self,
        acronyms: impl IntoAcronyms,
        source: &str,
        target: &str,
    ) -> AtlasResult<Vec<Option<RegionId>>> {
        let acronyms = acronyms.into_acronyms();
        let found = self.locate_acronyms(self.through(source)?, &acronyms)?;
        self.project(found, target, |r| r.id)
    }

    /// Store acronyms expressed in `scheme`.
    pub fn acronym_to_acronym_in(
        &self,
        acronyms: impl IntoAcronyms,
        scheme: &str,
    ) -> AtlasResult<Vec<Option<&'a str>>> {
        let acronyms = acronyms.into_acronyms();
        let found = self.locate_acronyms(self.direct(), &acronyms)?;
        self.project(found, scheme, |r| r.acronym.as_str())
    }

    /// Store ids expressed in `scheme`, as acronyms.
    pub fn atlas_id_to_acronym(
        &self,
        ids: impl IntoRegionIds,
        scheme: &str,
    ) -> AtlasResult<Vec<Option<&'a str>>> {
        let ids = ids.into_region_ids();
        let found = self.locate(self.direct(), &ids, |r| r.id)?;
        self.project(found, scheme, |r| r.acronym.as_str())
    }

    /// Store ids expressed in `scheme`.
    pub fn atlas_id_to_atlas_id(
        &self,
        ids: impl IntoRegionIds,
        scheme: &str,
    ) -> AtlasResult<Vec<Option<RegionId>>> {
        let ids = ids.into_region_ids();
        let found = self.locate(self.direct(), &ids, |r| r.id)?;
        self.project(found, scheme, |r| r.id)
    }

    /// Ids of `acronyms` in `scheme`, filtered by hemisphere.
    ///
    /// With no hemisphere on a lateralized scheme both sides are returned,
    /// left first.
    pub fn acronym_to_atlas_id(
        &self,
        acronyms: impl IntoAcronyms,
        scheme: &str,
        hemisphere: Option<Hemisphere>,
    ) -> AtlasResult<Lateral<Option<RegionId>>> {
        let scheme = infer_scheme(scheme, hemisphere);
        let column = self.mappings.column(&scheme)?;
        let acronyms = acronyms.into_acronyms();
        let found = self.locate_acronyms(self.direct(), &acronyms)?;

        let store = self.store;
        let side = |found: &[Option<usize>], h: Hemisphere| -> Vec<Option<usize>> {
            found
                .iter()
                .map(|p| p.map(|p| store.lateral_position(p, h)))
                .collect()
        };
        let filtered = match hemisphere {
            Some(Hemisphere::Left) => Lateral::Single(side(&found, Hemisphere::Left)),
            Some(Hemisphere::Right) => Lateral::Single(found),
            None if is_lateral(&scheme) => Lateral::Both {
                left: side(&found, Hemisphere::Left),
                right: found,
            },
            None => Lateral::Single(found),
        };

        let regions = store.regions();
        Ok(filtered.map(|p| p.map(|p| regions[column[p]].id)))
    }

    /// For each acronym, every position whose representative in `scheme`
    /// carries that acronym, split by hemisphere.
    ///
    /// Acronyms are resolved independently and stay individually addressable.
    pub fn acronym_to_index(
        &self,
        acronyms: impl IntoAcronyms,
        scheme: &str,
        hemisphere: Option<Hemisphere>,
    ) -> AtlasResult<BTreeMap<String, Lateral<usize>>> {
        let scheme = infer_scheme(scheme, hemisphere);
        let column = self.mappings.column(&scheme)?;
        let regions = self.store.regions();

        let mut index = BTreeMap::new();
        for acronym in acronyms.into_acronyms() {
            let (left, right): (Vec<usize>, Vec<usize>) = column
                .iter()
                .enumerate()
                .filter(|&(_, &m)| regions[m].acronym == acronym)
                .map(|(p, _)| p)
                .partition(|&p| regions[p].is_left());

            if left.is_empty() && right.is_empty() {
                if self.store.policy() == LookupPolicy::Strict {
                    return Err(AtlasError::NotFound(acronym));
                }
                debug!(%acronym, %scheme, "acronym not found");
            }

            let entry = match hemisphere {
                Some(Hemisphere::Left) => Lateral::Single(left),
                Some(Hemisphere::Right) => Lateral::Single(right),
                None => Lateral::Both { left, right },
            };
            index.insert(acronym, entry);
        }
        Ok(index)
    }

    /// Rows as seen through a scheme column.
    fn through(&self, scheme: &str) -> AtlasResult<Vec<(usize, &'a Region)>> {
        let regions = self.store.regions();
        Ok(self
            .mappings
            .column(scheme)?
            .iter()
            .enumerate()
            .map(|(p, &m)| (p, &regions[m]))
            .collect())
    }

    /// Rows as stored.
    fn direct(&self) -> Vec<(usize, &'a Region)> {
        self.store.regions().iter().enumerate().collect()
    }

    fn locate_acronyms(
        &self,
        rows: Vec<(usize, &'a Region)>,
        acronyms: &[String],
    ) -> AtlasResult<Vec<Option<usize>>> {
        self.locate(rows, acronyms.iter().map(String::as_str), |r| {
            r.acronym.as_str()
        })
    }

    /// First position matching each query.
    fn locate<'q, K, Q>(
        &self,
        rows: Vec<(usize, &'a Region)>,
        queries: impl IntoIterator<Item = &'q Q>,
        key: impl Fn(&'a Region) -> K,
    ) -> AtlasResult<Vec<Option<usize>>>
    where
        K: Eq + Hash + Borrow<Q>,
        Q: Eq + Hash + Display + ?Sized + 'q,
    {
        let mut index: HashMap<K, usize> = HashMap::with_capacity(rows.len());
        for (p, region) in rows {
            index.entry(key(region)).or_insert(p);
        }

        let strict = self.store.policy() == LookupPolicy::Strict;
        let mut missing = 0usize;
        let mut out = Vec::new();
        for q in queries {
            match index.get(q) {
                Some(&p) => out.push(Some(p)),
                None if strict => return Err(AtlasError::NotFound(q.to_string())),
                None => {
                    missing += 1;
                    out.push(None);
                }
            }
        }
        if missing > 0 {
            debug!(missing, "lookup values not found");
        }
        Ok(out)
    }

    fn project<R>(
        &self,
        found: Vec<Option<usize>>,
        target: &str,
        field: impl Fn(&'a Region) -> R,
    ) -> AtlasResult<Vec<Option<R>>> {
        let column = self.mappings.column(target)?;
        let regions = self.store.regions();
        Ok(found
            .into_iter()
            .map(|p| p.map(|p| field(&regions[column[p]])))
            .collect())
    }
}
