//! Nullable infrastructure for deterministic testing.
//!
//! Every collaborator the consensus core consumes (clock, storage, PoW,
//! authorization) is abstracted behind a trait. This crate provides
//! test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod pow;
pub mod store;
pub mod verifier;

pub use clock::NullClock;
pub use pow::{NullPow, PowEvent};
pub use store::{NullAddressStore, NullBlockStore, NullOrphanStore, NullTxHistory};
pub use verifier::NullVerifier;
