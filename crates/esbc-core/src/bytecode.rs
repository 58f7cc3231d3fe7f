//! Owned byte stream produced by one encode pass, with its hex form.

use core::{fmt, str::FromStr};

use crate::{DecodeError, DecodeResult};

/// An encoded program: optional string-table header, then one block per function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Bytecode {
    bytes: Vec<u8>,
}

impl Bytecode {
    /// Wraps raw bytes.
    pub const fn new(bytes: Vec<u8>) -> Self { Self { bytes } }
    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8] { &self.bytes }
    /// Consumes into the raw bytes.
    pub fn into_vec(self) -> Vec<u8> { self.bytes }
    /// Size in bytes.
    pub fn len(&self) -> usize { self.bytes.len() }
    /// Whether the stream is empty.
    pub fn is_empty(&self) -> bool { self.bytes.is_empty() }
    /// Lower-case hex, two digits per byte.
    pub fn to_hex(&self) -> String { hex::encode(&self.bytes) }

    /// Parses hex text; ASCII whitespace anywhere is ignored.
    pub fn from_hex(text: &str) -> DecodeResult<Self> {
        let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        Ok(Self { bytes: hex::decode(compact)? })
    }
}

impl From<Vec<u8>> for Bytecode {
    fn from(bytes: Vec<u8>) -> Self { Self { bytes } }
}

impl AsRef<[u8]> for Bytecode {
    fn as_ref(&self) -> &[u8] { &self.bytes }
}

impl fmt::Display for Bytecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.to_hex()) }
}

impl FromStr for Bytecode {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { Self::from_hex(s) }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Bytecode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Bytecode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = <String as serde::Deserialize>::deserialize(deserializer)?;
        Self::from_hex(&text).map_err(serde::de::Error::custom)
    }
}
