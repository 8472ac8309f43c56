//! Ancestor / descendant closures over the store's parent relation.

use std::str::FromStr;

use tracing::debug;

use crate::error::{AtlasError, AtlasResult};
use crate::region::Region;
use crate::store::TaxonomyStore;
use crate::traits::IntoRegionIds;

/// Traversal direction along parent links.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards the root (ancestors).
    Up,
    /// Away from the root (descendants).
    Down,
}

impl FromStr for Direction {
    type Err = AtlasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            _ => Err(AtlasError::InvalidDirection(s.to_string())),
        }
    }
}

/// Computes closures over a [`TaxonomyStore`].
///
/// The closure is the fixed point of repeatedly adding every parent (up) or
/// every child (down) of the current selection. It is computed with a
/// work list over the store's precomputed adjacency, so each position is
/// visited once.
#[derive(Clone, Copy, Debug)]
pub struct TreeNavigator<'a> {
    store: &'a TaxonomyStore,
}

impl<'a> TreeNavigator<'a> {
    pub fn new(store: &'a TaxonomyStore) -> Self {
        Self { store }
    }

    /// Seeds plus everything reachable from them in `direction`, in store order.
    pub fn navigate(
        &self,
        seeds: impl IntoRegionIds,
        direction: Direction,
    ) -> AtlasResult<Vec<&'a Region>> {
        let seeds = self.store.positions_of(seeds)?;
        let mask = self.closure_mask(&seeds, direction);
        let selected: Vec<&'a Region> = self
            .store
            .regions()
            .iter()
            .zip(&mask)
            .filter_map(|(r, &on)| on.then_some(r))
            .collect();
        debug!(
            seeds = seeds.len(),
            selected = selected.len(),
            ?direction,
            "tree closure"
        );
        Ok(selected)
    }

    /// Same as [`navigate`](Self::navigate) with the direction given by name.
    ///
    /// Anything but `"up"` / `"down"` fails before any traversal.
    pub fn navigate_named(
        &self,
        seeds: impl IntoRegionIds,
        direction: &str,
    ) -> AtlasResult<Vec<&'a Region>> {
        let direction: Direction = direction.parse()?;
        self.navigate(seeds, direction)
    }

    pub fn ancestors(&self, ids: impl IntoRegionIds) -> AtlasResult<Vec<&'a Region>> {
        self.navigate(ids, Direction::Up)
    }

    pub fn descendants(&self, ids: impl IntoRegionIds) -> AtlasResult<Vec<&'a Region>> {
        self.navigate(ids, Direction::Down)
    }

    /// Positions of `pos` and all its descendants, in store order.
    pub fn descendant_positions(&self, pos: usize) -> Vec<usize> {
        self.closure_mask(&[pos], Direction::Down)
            .into_iter()
            .enumerate()
            .filter_map(|(p, on)| on.then_some(p))
            .collect()
    }

    fn closure_mask(&self, seeds: &[usize], direction: Direction) -> Vec<bool> {
        let mut mask = vec![false; self.store.len()];
        let mut pending: Vec<usize> = Vec::with_capacity(seeds.len());
        for &p in seeds {
            if p < mask.len() && !mask[p] {
                mask[p] = true;
                pending.push(p);
            }
        }

        while let Some(p) = pending.pop() {
            match direction {
                Direction::Up => {
                    if let Some(parent) = self.store.parent_position(p)
                        && !mask[parent]
                    {
                        mask[parent] = true;
                        pending.push(parent);
                    }
                }
                Direction::Down => {
                    for &child in self.store.child_positions(p) {
                        if !mask[child] {
                            mask[child] = true;
                            pending.push(child);
                        }
                    }
                }
            }
        }
        mask
    }
}

impl TaxonomyStore {
    #[inline]
    pub fn navigator(&self) -> TreeNavigator<'_> {
        TreeNavigator::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::*;
    use crate::region::RegionId;
    use crate::store::LookupPolicy;

    fn ids(rows: &[&Region]) -> Vec<RegionId> {
        let mut v: Vec<RegionId> = rows.iter().map(|r| r.id).collect();
        v.sort();
        v
    }

    #[test]
    fn descendants_of_subtree() {
        let store = fixture_store();
        let nav = store.navigator();
        assert_eq!(ids(&nav.descendants(A).unwrap()), vec![A, B, C, D]);
        assert_eq!(ids(&nav.descendants(-A).unwrap()), vec![-D, -C, -B, -A]);
        assert_eq!(ids(&nav.descendants(D).unwrap()), vec![D]);
    }

    #[test]
    fn ancestors_reach_root() {
        let store = fixture_store();
        let nav = store.navigator();
        assert_eq!(ids(&nav.ancestors(D).unwrap()), vec![A, B, D, ROOT]);
        assert_eq!(ids(&nav.ancestors(-D).unwrap()), vec![-ROOT, -D, -B, -A]);
    }

    #[test]
    fn multiple_seeds_union() {
        let store = fixture_store();
        let nav = store.navigator();
        assert_eq!(ids(&nav.descendants([B, E]).unwrap()), vec![B, D, E]);
        assert_eq!(ids(&nav.ancestors([C, E]).unwrap()), vec![A, C, E, ROOT]);
    }

    #[test]
    fn root_descendants_cover_one_hemisphere() {
        let store = fixture_store();
        let all = store.navigator().descendants(ROOT).unwrap();
        assert_eq!(all.len(), 6);
        assert!(all.iter().all(|r| r.id > 0));
    }

    #[test]
    fn result_is_in_store_order() {
        let store = fixture_store();
        let rows = store.navigator().descendants(A).unwrap();
        let got: Vec<RegionId> = rows.iter().map(|r| r.id).collect();
        assert_eq!(got, vec![A, B, C, D]);
    }

    #[test]
    fn descendant_positions_match_ids() {
        let store = fixture_store();
        let b = store.position_of(B).unwrap();
        let d = store.position_of(D).unwrap();
        assert_eq!(store.navigator().descendant_positions(b), vec![b, d]);
    }

    #[test]
    fn invalid_direction_rejected() {
        let store = fixture_store();
        let err = store.navigator().navigate_named(A, "sideways").unwrap_err();
        assert_eq!(err, AtlasError::InvalidDirection("sideways".into()));
        assert_eq!(
            ids(&store.navigator().navigate_named(A, "DOWN").unwrap()),
            vec![A, B, C, D]
        );
    }

    #[test]
    fn unknown_seeds_follow_policy() {
        let store = fixture_store();
        assert_eq!(ids(&store.navigator().descendants([B, 404]).unwrap()), vec![B, D]);

        let strict =
            TaxonomyStore::from_raw_with_policy(&fixture_rows(), LookupPolicy::Strict).unwrap();
        assert_eq!(
            strict.navigator().descendants([B, 404]).unwrap_err(),
            AtlasError::UnknownId(404)
        );
    }
}
