//! # Lateralized brain-region atlas (atlas-regions)
//!
//! Holds a rooted taxonomy of anatomical regions, coarsens it into named
//! mapping schemes, and translates between region ids, acronyms and scheme
//! representatives, hemisphere-aware.
//!
//! ## Design
//!
//! The store is lateralized: every positive (right / unlateralized) region
//! gets a left copy with negated id and parent. Mappings are integer columns
//! of store length, pointing each position at the position of its
//! representative:
//!
//! ```text
//!              void  root  A   B   C   D   -root -A  -B  -C  -D
//! position      0     1    2   3   4   5    6     7   8   9   10
//! Coarse{A}     0     1    2   2   2   2    1     2   2   2   2
//! Coarse{A}-lr  0     1    2   2   2   2    1     7   7   7   7
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use atlas_regions::{Atlas, SchemeDef, TaxonomyStore, FULL_SCHEME};
//!
//! let store = TaxonomyStore::from_raw(&rows)?;
//! let atlas = Atlas::rebuild(store, &[SchemeDef::new("Beryl", beryl_ids)])?;
//!
//! let coarse = atlas.remap().remap(ids, FULL_SCHEME, "Beryl")?;
//! let subtree = atlas.descendants(CA1)?;
//! ```

pub mod atlas;
#[cfg(feature = "bevy")]
pub mod bevy;
pub mod codec;
pub mod error;
pub mod hemisphere;
pub mod mapping;
pub mod navigate;
pub mod region;
pub mod remap;
pub mod store;
pub mod traits;

#[cfg(test)]
pub(crate) mod fixture;

pub use atlas::Atlas;
pub use error::{AtlasError, AtlasResult, StoreError};
pub use hemisphere::{Hemisphere, Lateral};
pub use mapping::{
    is_lateral, lateral_name, MappingBuilder, MappingTable, SchemeDef, FULL_SCHEME,
    LATERAL_SUFFIX,
};
pub use navigate::{Direction, TreeNavigator};
pub use region::{decode_color, RawRegion, Region, RegionId, Rgb, LEFT_SUFFIX, VOID_ID};
pub use remap::{infer_scheme, RemapEngine};
pub use store::{LookupPolicy, TaxonomyStore};
pub use traits::{IntoAcronyms, IntoRegionIds};
