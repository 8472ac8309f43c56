//! Input normalization: every public lookup accepts a scalar or a sequence.

use crate::region::RegionId;

/// Values accepted wherever region ids are expected.
///
/// A single id becomes a one-element batch.
pub trait IntoRegionIds {
    fn into_region_ids(self) -> Vec<RegionId>;
}

impl IntoRegionIds for RegionId {
    #[inline]
    fn into_region_ids(self) -> Vec<RegionId> {
        vec![self]
    }
}

impl IntoRegionIds for &[RegionId] {
    #[inline]
    fn into_region_ids(self) -> Vec<RegionId> {
        self.to_vec()
    }
}

impl<const N: usize> IntoRegionIds for [RegionId; N] {
    #[inline]
    fn into_region_ids(self) -> Vec<RegionId> {
        self.to_vec()
    }
}

impl IntoRegionIds for Vec<RegionId> {
    #[inline]
    fn into_region_ids(self) -> Vec<RegionId> {
        self
    }
}

impl IntoRegionIds for &Vec<RegionId> {
    #[inline]
    fn into_region_ids(self) -> Vec<RegionId> {
        self.clone()
    }
}

/// Values accepted wherever acronyms are expected.
pub trait IntoAcronyms {
    fn into_acronyms(self) -> Vec<String>;
}

impl IntoAcronyms for &str {
    #[inline]
    fn into_acronyms(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoAcronyms for String {
    #[inline]
    fn into_acronyms(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoAcronyms for &[&str] {
    fn into_acronyms(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl<const N: usize> IntoAcronyms for [&str; N] {
    fn into_acronyms(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl IntoAcronyms for Vec<&str> {
    fn into_acronyms(self) -> Vec<String> {
        self.into_iter().map(str::to_string).collect()
    }
}

impl IntoAcronyms for &[String] {
    fn into_acronyms(self) -> Vec<String> {
        self.to_vec()
    }
}

impl IntoAcronyms for Vec<String> {
    #[inline]
    fn into_acronyms(self) -> Vec<String> {
        self
    }
}
