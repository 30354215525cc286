//! Block hash types.
//!
//! A block is identified by its full 32-byte digest ([`BlockHash`]) and keyed
//! everywhere else by its [`HashLow`]: the same digest with the first eight
//! bytes cleared.

use crate::error::ParseHashError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of leading bytes cleared when deriving a [`HashLow`].
pub const HASH_LOW_MASKED_BYTES: usize = 8;

/// A full 32-byte block digest.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockHash([u8; 32]);

impl BlockHash {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// The repository key for this digest.
    pub fn hash_low(&self) -> HashLow {
        HashLow::new(self.0)
    }
}

/// Canonical block key: a [`BlockHash`] with its first eight bytes zeroed.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HashLow([u8; 32]);

impl HashLow {
    pub const ZERO: Self = Self([0u8; 32]);

    /// Build a key from raw bytes, masking the leading bytes.
    pub fn new(mut bytes: [u8; 32]) -> Self {
        bytes[..HASH_LOW_MASKED_BYTES].fill(0);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl From<BlockHash> for HashLow {
    fn from(hash: BlockHash) -> Self {
        hash.hash_low()
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({}\u{2026})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl fmt::Debug for HashLow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The masked prefix is always zero; show the first significant bytes.
        write!(
            f,
            "HashLow({}\u{2026})",
            hex::encode(&self.0[HASH_LOW_MASKED_BYTES..HASH_LOW_MASKED_BYTES + 4])
        )
    }
}

impl fmt::Display for HashLow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl FromStr for BlockHash {
    type Err = ParseHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex::decode32(s).map(Self)
    }
}

impl FromStr for HashLow {
    type Err = ParseHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex::decode32(s).map(Self::new)
    }
}

// Inline hex helpers to avoid adding the `hex` crate as a dependency of types.
pub(crate) mod hex {
    use crate::error::ParseHashError;

    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    pub fn decode32(s: &str) -> Result<[u8; 32], ParseHashError> {
        decode_fixed::<32>(s)
    }

    pub fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], ParseHashError> {
        let raw = s.as_bytes();
        if raw.len() != N * 2 {
            return Err(ParseHashError::InvalidLength {
                expected: N * 2,
                actual: raw.len(),
            });
        }
        let mut out = [0u8; N];
        for (i, byte) in out.iter_mut().enumerate() {
            let hi = nibble(raw[2 * i]).ok_or(ParseHashError::InvalidCharacter(2 * i))?;
            let lo = nibble(raw[2 * i + 1]).ok_or(ParseHashError::InvalidCharacter(2 * i + 1))?;
            *byte = (hi << 4) | lo;
        }
        Ok(out)
    }

    fn nibble(c: u8) -> Option<u8> {
        match c {
            b'0'..=b'9' => Some(c - b'0'),
            b'a'..=b'f' => Some(c - b'a' + 10),
            b'A'..=b'F' => Some(c - b'A' + 10),
            _ => None,
        }
    }
}
