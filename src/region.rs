//! Region rows: the raw (unlateralized) input shape and the stored shape.

use serde::{Deserialize, Serialize};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Region id. Positive = right/unlateralized, negative = left copy, 0 = void.
pub type RegionId = i64;

/// Id of the void (outside-of-brain) region.
pub const VOID_ID: RegionId = 0;

/// Suffix appended to the name of left-hemisphere copies.
pub const LEFT_SUFFIX: &str = " (left)";

/// 8-bit RGB color.
#[repr(C)]
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    IntoBytes,
    FromBytes,
    Immutable,
    KnownLayout,
)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    /// Used for regions without a usable source color.
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    #[inline]
    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// Decode a hex triplet (`"ff8800"` or `"#FF8800"`).
///
/// Missing or malformed colors decode to [`Rgb::WHITE`].
pub fn decode_color(hex: Option<&str>) -> Rgb {
    let Some(hex) = hex else {
        return Rgb::WHITE;
    };
    let hex = hex.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Rgb::WHITE;
    }
    match u32::from_str_radix(hex, 16) {
        Ok(v) => Rgb::new((v >> 16) as u8, (v >> 8) as u8, v as u8),
        Err(_) => Rgb::WHITE,
    }
}

/// One unlateralized row from the hierarchy source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRegion {
    pub id: RegionId,
    pub name: String,
    pub acronym: String,
    #[serde(default)]
    pub color: Option<String>,
    pub depth: u32,
    #[serde(default)]
    pub parent_id: Option<RegionId>,
}

impl RawRegion {
    pub fn new(
        id: RegionId,
        name: impl Into<String>,
        acronym: impl Into<String>,
        depth: u32,
        parent_id: Option<RegionId>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            acronym: acronym.into(),
            color: None,
            depth,
            parent_id,
        }
    }

    pub fn with_color(mut self, hex: impl Into<String>) -> Self {
        self.color = Some(hex.into());
        self
    }
}

/// A row of the lateralized store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    pub acronym: String,
    pub color: Rgb,
    /// Depth from the root.
    pub level: u32,
    pub parent: Option<RegionId>,
}

impl Region {
    pub(crate) fn from_raw(raw: &RawRegion) -> Self {
        Self {
            id: raw.id,
            name: raw.name.clone(),
            acronym: raw.acronym.clone(),
            color: decode_color(raw.color.as_deref()),
            level: raw.depth,
            parent: raw.parent_id,
        }
    }

    /// Left-hemisphere copy: id and parent negated, name suffixed.
    pub(crate) fn mirrored(&self) -> Self {
        Self {
            id: -self.id,
            name: format!("{}{}", self.name, LEFT_SUFFIX),
            acronym: self.acronym.clone(),
            color: self.color,
            level: self.level,
            parent: self.parent.map(|p| -p),
        }
    }

    #[inline]
    pub fn is_void(&self) -> bool {
        self.id == VOID_ID
    }

    #[inline]
    pub fn is_left(&self) -> bool {
        self.id < 0
    }
}
