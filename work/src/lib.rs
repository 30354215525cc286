//! Proof-of-work collaborator for the consensus core.
//!
//! Consensus never mines. It only needs a block's weight, which is derived
//! from a hash: the raw block hash before the RandomX fork, a RandomX hash of
//! the block bytes for round-closing blocks after it. The [`PowProvider`]
//! trait is that seam; [`RandomXSchedule`] tracks when the fork activates.

pub mod error;
pub mod provider;
pub mod schedule;
pub mod weight;

pub use error::WorkError;
pub use provider::{PowProvider, Sha256dPow};
pub use schedule::RandomXSchedule;
pub use weight::hash_to_weight;
