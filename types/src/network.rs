//! Network identifier.

use serde::{Deserialize, Serialize};

/// Identifies which XDAG network a block belongs to.
///
/// Every block carries the tag of the network it was created for; the
/// consensus facade refuses blocks tagged for another network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkId {
    /// The production network.
    Main,
    /// The public test network.
    Test,
    /// Local development network.
    Dev,
}

impl NetworkId {
    /// Header type tag written into blocks of this network.
    pub fn block_type_tag(&self) -> u8 {
        match self {
            Self::Main => 0x08,
            Self::Test => 0x05,
            Self::Dev => 0x0c,
        }
    }

    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "mainnet",
            Self::Test => "testnet",
            Self::Dev => "devnet",
        }
    }
}
