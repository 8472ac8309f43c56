//! Taxonomy store: the flat, lateralized region table.
//!
//! Built once from unlateralized [`RawRegion`] rows:
//!
//! ```text
//! position: 0      1 .. n-1          n .. 2n-2
//!           void   raw rows (right)  mirrored rows (left, ids negated)
//! ```
//!
//! The left copy of raw position `p` lives at `p + hemisphere_offset()`,
//! where the offset is the number of mirrored rows of the loaded table.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::{AtlasError, AtlasResult, StoreError};
use crate::hemisphere::Hemisphere;
use crate::region::{RawRegion, Region, RegionId, Rgb, VOID_ID};
use crate::traits::IntoRegionIds;

/// What lookups do with values missing from the store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LookupPolicy {
    /// Drop unknown ids (or report `None`); output may be shorter than input.
    #[default]
    Lenient,
    /// Fail on the first unknown value.
    Strict,
}

/// Immutable, lateralized region table.
#[derive(Clone, Debug, PartialEq)]
pub struct TaxonomyStore {
    regions: Vec<Region>,
    id_to_pos: HashMap<RegionId, usize>,
    parent_pos: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    root: usize,
    unlateralized_len: usize,
    policy: LookupPolicy,
}

impl TaxonomyStore {
    /// Build a lenient store from unlateralized rows (void first).
    pub fn from_raw(rows: &[RawRegion]) -> AtlasResult<Self> {
        Self::from_raw_with_policy(rows, LookupPolicy::default())
    }

    pub fn from_raw_with_policy(rows: &[RawRegion], policy: LookupPolicy) -> AtlasResult<Self> {
        // 1. Validate
        let root_raw = Self::validate_rows(rows)?;

        // 2. Lateralize: originals followed by left-hemisphere mirrors
        let mut regions: Vec<Region> = rows.iter().map(Region::from_raw).collect();
        let mirrors: Vec<Region> = regions
            .iter()
            .filter(|r| r.id > 0)
            .map(Region::mirrored)
            .collect();
        regions.extend(mirrors);
        regions[0].color = Rgb::BLACK;

        // 3. Build indices
        let id_to_pos: HashMap<RegionId, usize> = regions
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id, i))
            .collect();

        let parent_pos: Vec<Option<usize>> = regions
            .iter()
            .map(|r| r.parent.and_then(|p| id_to_pos.get(&p).copied()))
            .collect();

        let mut children: Vec<Vec<usize>> = vec![Vec::new(); regions.len()];
        for (pos, parent) in parent_pos.iter().enumerate() {
            if let Some(parent) = *parent {
                children[parent].push(pos);
            }
        }

        debug!(
            rows = rows.len(),
            lateralized = regions.len(),
            "built taxonomy store"
        );

        Ok(Self {
            regions,
            id_to_pos,
            parent_pos,
            children,
            root: root_raw,
            unlateralized_len: rows.len(),
            policy,
        })
    }

    /// Returns the raw position of the root.
    fn validate_rows(rows: &[RawRegion]) -> Result<usize, StoreError> {
        let first = rows.first().ok_or(StoreError::Empty)?;
        if first.id != VOID_ID {
            return Err(StoreError::MissingVoid(first.id));
        }

        let mut ids = HashSet::with_capacity(rows.len());
        ids.insert(VOID_ID);
        for row in &rows[1..] {
            if row.id <= 0 {
                return Err(StoreError::NonPositiveId(row.id));
            }
            if !ids.insert(row.id) {
                return Err(StoreError::DuplicateId(row.id));
            }
        }

        for row in rows {
            if let Some(parent) = row.parent_id
                && !ids.contains(&parent)
            {
                return Err(StoreError::MissingParent { id: row.id, parent });
            }
        }

        rows.iter()
            .enumerate()
            .skip(1)
            .find(|(_, r)| r.parent_id.is_none())
            .map(|(i, _)| i)
            .ok_or(StoreError::MissingRoot)
    }

    /// Rows for `ids`, in input order and multiplicity.
    ///
    /// Unknown ids are dropped under [`LookupPolicy::Lenient`], so the result
    /// can be shorter than the input; [`LookupPolicy::Strict`] fails instead.
    pub fn get(&self, ids: impl IntoRegionIds) -> AtlasResult<Vec<&Region>> {
        Ok(self
            .positions_of(ids)?
            .into_iter()
            .map(|p| &self.regions[p])
            .collect())
    }

    /// Store positions for `ids`, following the same policy as [`get`](Self::get).
    pub fn positions_of(&self, ids: impl IntoRegionIds) -> AtlasResult<Vec<usize>> {
        let ids = ids.into_region_ids();
        let mut out = Vec::with_capacity(ids.len());
        for id in &ids {
            match self.id_to_pos.get(id) {
                Some(&pos) => out.push(pos),
                None if self.policy == LookupPolicy::Strict => {
                    return Err(AtlasError::UnknownId(*id));
                }
                None => {}
            }
        }
        if out.len() < ids.len() {
            debug!(dropped = ids.len() - out.len(), "unknown region ids dropped");
        }
        Ok(out)
    }

    /// Regions that are nobody's parent, in store order.
    pub fn leaves(&self) -> Vec<&Region> {
        let parents: HashSet<RegionId> = self.regions.iter().filter_map(|r| r.parent).collect();
        self.regions
            .iter()
            .filter(|r| !parents.contains(&r.id))
            .collect()
    }

    /// Position of `id`, if present.
    #[inline]
    pub fn position_of(&self, id: RegionId) -> Option<usize> {
        self.id_to_pos.get(&id).copied()
    }

    #[inline]
    pub fn contains_id(&self, id: RegionId) -> bool {
        self.id_to_pos.contains_key(&id)
    }

    #[inline]
    pub fn region_at(&self, pos: usize) -> Option<&Region> {
        self.regions.get(pos)
    }

    /// All rows in store order.
    #[inline]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn ids(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.regions.iter().map(|r| r.id)
    }

    pub fn acronyms(&self) -> impl Iterator<Item = &str> + '_ {
        self.regions.iter().map(|r| r.acronym.as_str())
    }

    /// Total number of rows, both hemispheres.
    #[inline]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    #[inline]
    pub fn root_position(&self) -> usize {
        self.root
    }

    #[inline]
    pub fn root_id(&self) -> RegionId {
        self.regions[self.root].id
    }

    /// The void region is always the first row.
    #[inline]
    pub fn void_position(&self) -> usize {
        0
    }

    /// Number of rows before lateralization (void included).
    #[inline]
    pub fn unlateralized_len(&self) -> usize {
        self.unlateralized_len
    }

    /// Distance between a right-hemisphere row and its left copy.
    #[inline]
    pub fn hemisphere_offset(&self) -> usize {
        self.regions.len() - self.unlateralized_len
    }

    /// Move a position to the requested hemisphere.
    ///
    /// Void has no left copy and stays in place.
    pub fn lateral_position(&self, pos: usize, hemisphere: Hemisphere) -> usize {
        let offset = self.hemisphere_offset();
        match hemisphere {
            Hemisphere::Left if pos > 0 && pos < self.unlateralized_len => pos + offset,
            Hemisphere::Right if pos >= self.unlateralized_len => pos - offset,
            _ => pos,
        }
    }

    #[inline]
    pub fn policy(&self) -> LookupPolicy {
        self.policy
    }

    #[inline]
    pub(crate) fn parent_position(&self, pos: usize) -> Option<usize> {
        self.parent_pos.get(pos).copied().flatten()
    }

    #[inline]
    pub(crate) fn child_positions(&self, pos: usize) -> &[usize] {
        self.children.get(pos).map(Vec::as_slice).unwrap_or(&[])
    }
}
