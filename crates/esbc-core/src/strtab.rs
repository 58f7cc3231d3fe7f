//! String table: deduplicated literals referenced by `SREF id`.
//!
//! Header layout (only at offset 0): `0x00 count:u8` then, per entry,
//! `len:u8` followed by the raw UTF-8 bytes.

use thiserror::Error;

use crate::{isa::Op, ByteReader, ByteWriter, DecodeResult, MAX_STRINGS, MAX_STR_LEN};

/// Capacity errors raised while interning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// More distinct strings than one count byte can describe.
    #[error("string table full (255 entries)")]
    Full,
    /// A literal longer than one length byte can describe.
    #[error("string literal of {len} bytes exceeds 255")]
    TooLong {
        /// Byte length of the literal.
        len: usize,
    },
}

/// Ordered set of unique strings; ids are first-seen positions.
///
/// At most 255 entries, so lookups stay a linear scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringTable {
    entries: Vec<String>,
}

impl StringTable {
    /// Empty table.
    pub fn new() -> Self { Self::default() }

    /// Number of entries.
    pub fn len(&self) -> usize { self.entries.len() }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Entry by id.
    pub fn get(&self, id: u8) -> Option<&str> { self.entries.get(usize::from(id)).map(String::as_str) }

    /// Iterates `(id, text)` in id order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &str)> {
        // ids fit in u8 by construction (see `intern`/`read_header`)
        self.entries
            .iter()
            .enumerate()
            .map(|(i, s)| (u8::try_from(i).unwrap_or(u8::MAX), s.as_str()))
    }

    /// Interns `s` and returns its id; identical strings share one id.
    pub fn intern(&mut self, s: &str) -> Result<u8, TableError> {
        if let Some(idx) = self.entries.iter().position(|e| e == s) {
            return u8::try_from(idx).map_err(|_| TableError::Full);
        }
        if s.len() > MAX_STR_LEN {
            return Err(TableError::TooLong { len: s.len() });
        }
        if self.entries.len() >= MAX_STRINGS {
            return Err(TableError::Full);
        }
        self.entries.push(s.to_owned());
        u8::try_from(self.entries.len() - 1).map_err(|_| TableError::Full)
    }

    /// Writes the header; writes nothing for an empty table.
    pub fn write_header(&self, w: &mut ByteWriter) {
        if self.entries.is_empty() {
            return;
        }
        w.write_op(Op::StrTab);
        w.write_u8(u8::try_from(self.entries.len()).unwrap_or(u8::MAX));
        for s in &self.entries {
            w.write_str8(s.as_bytes());
        }
    }

    /// Reads the header if the next byte is `STRTAB`, else returns an empty table
    /// and leaves the cursor untouched.
    pub fn read_header(r: &mut ByteReader<'_>) -> DecodeResult<Self> {
        let mut table = Self::new();
        if r.peek_u8() != Some(Op::StrTab.byte()) {
            return Ok(table);
        }
        r.read_u8()?;
        let count = r.read_u8()?;
        for _ in 0..count {
            // duplicates from a foreign encoder keep their own slot
            table.entries.push(r.read_str8()?.to_owned());
        }
        Ok(table)
    }
}
