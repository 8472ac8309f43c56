//! Small hierarchy shared by unit tests.
//!
//! ```text
//! void
//! root ─┬─ A ─┬─ B ── D
//!       │     └─ C
//!       └─ E
//! ```

use crate::mapping::{MappingBuilder, MappingTable, SchemeDef};
use crate::region::{RawRegion, RegionId, VOID_ID};
use crate::store::TaxonomyStore;

pub const ROOT: RegionId = 997;
pub const A: RegionId = 10;
pub const B: RegionId = 20;
pub const C: RegionId = 30;
pub const D: RegionId = 40;
pub const E: RegionId = 50;

pub fn fixture_rows() -> Vec<RawRegion> {
    vec![
        RawRegion::new(VOID_ID, "void", "void", 0, None).with_color("aabbcc"),
        RawRegion::new(ROOT, "root", "root", 0, None).with_color("FFFFFF"),
        RawRegion::new(A, "Area A", "A", 1, Some(ROOT)).with_color("ff0000"),
        RawRegion::new(B, "Area B", "B", 2, Some(A)).with_color("00ff00"),
        RawRegion::new(C, "Area C", "C", 2, Some(A)).with_color("0000ff"),
        RawRegion::new(D, "Area D", "D", 3, Some(B)).with_color("123456"),
        RawRegion::new(E, "Area E", "E", 1, Some(ROOT)),
    ]
}

pub fn fixture_store() -> TaxonomyStore {
    TaxonomyStore::from_raw(&fixture_rows()).unwrap()
}

/// Coarse scheme `{A, E}` and finer scheme `{B, C, E}`.
pub fn fixture_schemes() -> Vec<SchemeDef> {
    vec![
        SchemeDef::new("Fine", vec![B, C, E]),
        SchemeDef::new("Coarse", vec![A, E]),
    ]
}

pub fn fixture_table(store: &TaxonomyStore) -> MappingTable {
    MappingBuilder::new(store)
        .build_table(&fixture_schemes())
        .unwrap()
}
