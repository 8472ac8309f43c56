//! Content fingerprints used to detect a stale mapping lock.
//!
//! Uses FNV-1a: fast, stable across platforms and releases.

use atlas_regions::{RawRegion, SchemeDef};

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// FNV-1a 64-bit hash.
pub const fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = FNV_OFFSET;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

/// Streaming FNV-1a over several fields.
#[derive(Clone, Copy, Debug)]
struct Fnv(u64);

impl Fnv {
    fn new() -> Self {
        Self(FNV_OFFSET)
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
    }

    /// Field separator, so ("ab", "c") and ("a", "bc") differ.
    fn sep(&mut self) {
        self.write(&[0xff]);
    }

    fn finish(self) -> String {
        format!("{:016x}", self.0)
    }
}

/// Fingerprint of the hierarchy: ids, parents, depths and acronyms.
///
/// Names and colors don't affect mappings and are left out.
pub fn regions_fingerprint(regions: &[RawRegion]) -> String {
    let mut h = Fnv::new();
    for r in regions {
        h.write(&r.id.to_le_bytes());
        h.write(&r.parent_id.unwrap_or(i64::MIN).to_le_bytes());
        h.write(&r.depth.to_le_bytes());
        h.write(r.acronym.as_bytes());
        h.sep();
    }
    h.finish()
}

/// Fingerprint of a scheme's member set (order and repeats ignored).
pub fn scheme_fingerprint(scheme: &SchemeDef) -> String {
    let mut members = scheme.members.clone();
    members.sort_unstable();
    members.dedup();
    let mut h = Fnv::new();
    for id in members {
        h.write(&id.to_le_bytes());
    }
    h.finish()
}
