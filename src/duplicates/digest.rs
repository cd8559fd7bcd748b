//! Row key canonicalization and hashing.
//!
//! The key values of a row are concatenated in key order, each followed by a
//! unit-separator byte, with nulls written as `NULL`. The buffer is hashed
//! with BLAKE3 into a 32-byte [`Digest`].

use std::fmt;

use serde::{Serialize, Serializer};

use crate::fields::KeyFieldList;
use crate::source::{Row, NULL_LITERAL};

/// Byte written after every key value (ASCII unit separator).
pub const FIELD_SEPARATOR: u8 = 0x1F;

/// Fixed-size digest of a row's key values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; 32]);

impl Digest {
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hexadecimal (64 characters).
    #[must_use]
    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Digest `row` over `keys`.
///
/// The same [`KeyFieldList`] must be used for every row of a run; a
/// different key order is a different key.
#[must_use]
pub fn digest_row(row: &Row, keys: &KeyFieldList) -> Digest {
    let mut hasher = blake3::Hasher::new();
    for &pos in keys.positions() {
        let text = row.value(pos).as_display().unwrap_or(NULL_LITERAL);
        hasher.update(text.as_bytes());
        hasher.update(&[FIELD_SEPARATOR]);
    }
    Digest(*hasher.finalize().as_bytes())
}
