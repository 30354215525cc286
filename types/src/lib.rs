//! Fundamental types for the XDAG node core.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! amounts, hashes, block links, blocks and their mutable metadata, timestamps,
//! chain parameters, block flags, and the chain tip/statistics records.

pub mod address;
pub mod amount;
pub mod block;
pub mod error;
pub mod hash;
pub mod keys;
pub mod network;
pub mod params;
pub mod state;
pub mod stats;
pub mod time;

pub use address::{AccountId, Address, LinkKind, LinkTarget};
pub use amount::{XAmount, XUnit};
pub use block::{Block, BlockInfo};
pub use error::{AmountError, ParseHashError};
pub use hash::{BlockHash, HashLow};
pub use keys::{PublicKey, Signature};
pub use network::NetworkId;
pub use params::ChainParams;
pub use primitive_types::U256;
pub use state::{BlockFlag, BlockFlags};
pub use stats::{XdagStats, XdagTopStatus, HASHRATE_SAMPLES};
pub use time::{Clock, SystemClock, XdagTime};

/// Block weight. Cumulative difficulty is the sum of self-weights along the
/// max-difficulty path, so it needs the full 256-bit range.
pub type Difficulty = U256;
