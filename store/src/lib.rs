//! Storage collaborator traits for the XDAG node core.
//!
//! Every storage backend (on-disk, in-memory for testing) implements these
//! traits. The consensus core depends only on the traits and treats each
//! call as synchronous.

pub mod address;
pub mod block;
pub mod error;
pub mod orphan;
pub mod tx_history;

pub use address::AddressStore;
pub use block::BlockStore;
pub use error::StoreError;
pub use orphan::OrphanStore;
pub use tx_history::{TxHistory, TxHistoryStore};
