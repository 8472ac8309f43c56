//! Binary encoding of a [`MappingTable`].
//!
//! ```text
//! ┌────────────┬────────────┬────────────┬──────────────┐
//! │ magic "ATLM" │ version u32 │ rows u32 │ columns u32   │  16-byte header
//! ├────────────┴────────────┴────────────┴──────────────┤
//! │ per column: name_len u32 │ name (utf-8) │ rows × u32 │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian.

use zerocopy::byteorder::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::{AtlasError, AtlasResult};
use crate::mapping::MappingTable;

pub const MAGIC: [u8; 4] = *b"ATLM";
pub const VERSION: u32 = 1;

#[repr(C)]
#[derive(Clone, Copy, Debug, IntoBytes, FromBytes, Immutable, KnownLayout)]
struct Header {
    magic: [u8; 4],
    version: U32,
    rows: U32,
    columns: U32,
}

/// Encode `table` into the binary layout.
///
/// Fails with [`AtlasError::Codec`] when a count, name length or position
/// does not fit in a `u32`.
pub fn encode(table: &MappingTable) -> AtlasResult<Vec<u8>> {
    let header = Header {
        magic: MAGIC,
        version: U32::new(VERSION),
        rows: to_u32(table.rows(), "row count")?,
        columns: to_u32(table.len(), "column count")?,
    };

    let mut out = Vec::with_capacity(
        size_of::<Header>() + table.len() * (table.rows() * 4 + 32),
    );
    out.extend_from_slice(header.as_bytes());
    for (name, column) in table.columns() {
        out.extend_from_slice(to_u32(name.len(), "column name length")?.as_bytes());
        out.extend_from_slice(name.as_bytes());
        let values = column
            .iter()
            .map(|&p| to_u32(p, "position"))
            .collect::<AtlasResult<Vec<U32>>>()?;
        out.extend_from_slice(values.as_bytes());
    }
    Ok(out)
}

fn to_u32(value: usize, what: &str) -> AtlasResult<U32> {
    u32::try_from(value)
        .map(U32::new)
        .map_err(|_| codec_err(format!("{what} {value} exceeds u32")))
}

/// Decode and validate a table written by [`encode`].
pub fn decode(bytes: &[u8]) -> AtlasResult<MappingTable> {
    let (header, mut rest) =
        Header::read_from_prefix(bytes).map_err(|_| codec_err("truncated header"))?;
    if header.magic != MAGIC {
        return Err(codec_err("bad magic"));
    }
    if header.version.get() != VERSION {
        return Err(codec_err(format!(
            "unsupported version {}",
            header.version.get()
        )));
    }

    let rows = header.rows.get() as usize;
    let mut table = MappingTable::new(rows);
    for _ in 0..header.columns.get() {
        let (name_len, tail) =
            U32::read_from_prefix(rest).map_err(|_| codec_err("truncated column name"))?;
        let name_len = name_len.get() as usize;
        if tail.len() < name_len {
            return Err(codec_err("truncated column name"));
        }
        let (name, tail) = tail.split_at(name_len);
        let name = std::str::from_utf8(name).map_err(|e| codec_err(e.to_string()))?;

        let (values, tail) = <[U32]>::ref_from_prefix_with_elems(tail, rows)
            .map_err(|_| codec_err(format!("truncated column '{name}'")))?;
        let column: Vec<usize> = values.iter().map(|v| v.get() as usize).collect();
        table.insert(name, column)?;
        rest = tail;
    }

    if !rest.is_empty() {
        return Err(codec_err(format!("{} trailing bytes", rest.len())));
    }
    Ok(table)
}

fn codec_err(msg: impl Into<String>) -> AtlasError {
    AtlasError::Codec(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::*;

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn oversized_values_are_rejected() {
        let too_big = u32::MAX as usize + 1;
        assert_eq!(
            to_u32(too_big, "position"),
            Err(AtlasError::Codec("position 4294967296 exceeds u32".into()))
        );
        assert_eq!(to_u32(7, "position").unwrap().get(), 7);
    }

    #[test]
    fn header_is_sixteen_bytes() {
        assert_eq!(size_of::<Header>(), 16);
    }

    #[test]
    fn decodes_what_it_encodes() {
        let store = fixture_store();
        let table = fixture_table(&store);
        let bytes = encode(&table).unwrap();
        assert_eq!(&bytes[..4], b"ATLM");
        assert_eq!(decode(&bytes).unwrap(), table);
    }

    #[test]
    fn rejects_corrupt_input() {
        let store = fixture_store();
        let bytes = encode(&fixture_table(&store)).unwrap();

        assert!(matches!(decode(&bytes[..10]), Err(AtlasError::Codec(_))));
        assert!(matches!(
            decode(&bytes[..bytes.len() - 1]),
            Err(AtlasError::Codec(_))
        ));

        let mut bad_magic = bytes.clone();
        bad_magic[0] = b'X';
        assert_eq!(decode(&bad_magic), Err(AtlasError::Codec("bad magic".into())));

        let mut extra = bytes.clone();
        extra.push(0);
        assert!(matches!(decode(&extra), Err(AtlasError::Codec(_))));
    }

    #[test]
    fn decoded_columns_are_validated() {
        let mut table = MappingTable::new(2);
        table.insert("x", vec![0, 1]).unwrap();
        let mut bytes = encode(&table).unwrap();
        // Last value points past the table
        let n = bytes.len();
        bytes[n - 4] = 7;
        assert!(matches!(
            decode(&bytes),
            Err(AtlasError::PositionOutOfRange { position: 7, .. })
        ));
    }
}
