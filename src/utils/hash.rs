//! Content hashing for fingerprints and signatures.
//!
//! Every identifier the reducer hands out is a 128-bit [`ContentHash`]:
//! - the fingerprint of an input url list (the job key)
//! - the signature of a produced stylesheet or sprite sheet
//!
//! Hashes are the first 16 bytes of a blake3 digest, so identical input
//! always produces the identical identifier.
//!
//! # Usage
//!
//! ```ignore
//! use crate::utils::hash::ContentHash;
//!
//! let key = ContentHash::of("a.css::b.css");
//! key.to_hex();       // "3f2a..." (32 chars)
//! key.to_string();    // "3f2a9c1e-...." (8-4-4-4-12)
//! ```

use std::fmt;

/// A 128-bit content hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Number of hex characters in the undashed rendering.
    pub const HEX_LEN: usize = 32;

    /// Hash arbitrary content.
    pub fn of<T: AsRef<[u8]> + ?Sized>(data: &T) -> Self {
        let digest = blake3::hash(data.as_ref());
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest.as_bytes()[..16]);
        Self(bytes)
    }

    /// Hash optional content; `None` hashes like empty content.
    pub fn of_opt<T: AsRef<[u8]> + ?Sized>(data: Option<&T>) -> Self {
        match data {
            Some(data) => Self::of(data),
            None => Self::of(&[] as &[u8]),
        }
    }

    /// The all-zero hash, returned when a url cannot be decoded.
    #[inline]
    pub const fn empty() -> Self {
        Self([0; 16])
    }

    /// Check if this is the empty/zero hash.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == [0; 16]
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// 32 lowercase hex characters, no separators.
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex, with or without `-` separators.
    pub fn from_hex(s: &str) -> Option<Self> {
        let compact: String = s.chars().filter(|c| *c != '-').collect();
        if compact.len() != Self::HEX_LEN {
            return None;
        }
        let bytes = hex::decode(compact).ok()?;
        let mut arr = [0u8; 16];
        arr.copy_from_slice(&bytes);
        Some(Self(arr))
    }
}

impl fmt::Display for ContentHash {
    /// Grouped 8-4-4-4-12 form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(
            f,
            "{}-{}-{}-{}-{}",
            &hex[..8],
            &hex[8..12],
            &hex[12..16],
            &hex[16..20],
            &hex[20..]
        )
    }
}
