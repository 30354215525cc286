//! Consensus over the XDAG block DAG.
//!
//! Blocks enter through [`Blockchain::import_block`]. Each admitted block is
//! weighed, and if its cumulative difficulty beats the current top the
//! canonical path is rewound onto it. A periodic promotion pass
//! ([`Blockchain::check_new_main`]) finalizes buried blocks on that path as
//! main blocks, minting their reward and settling everything they reference.
//!
//! ## Module overview
//!
//! - [`blockchain`]: The facade: single writer lock, concurrent read queries.
//! - [`import`]: Admission pipeline and [`ImportResult`].
//! - `difficulty`: Self-weight and cumulative difficulty.
//! - `fork_choice`: Top selection and main-chain path rewinding.
//! - `main_chain`: Promotion and demotion of main blocks.
//! - [`pool`]: Extra pool and orphan bookkeeping.
//! - `journal`: Rollback of failed imports and promotion passes.
//! - [`events`]: Chain events for subscribers.
//! - [`error`]: Consensus error types.

pub mod blockchain;
mod difficulty;
pub mod error;
pub mod events;
mod fork_choice;
pub mod import;
mod journal;
mod main_chain;
pub mod pool;
mod state;

#[cfg(test)]
pub(crate) mod testkit;

pub use blockchain::{Blockchain, ChainCollaborators};
pub use error::ConsensusError;
pub use events::{ChainEvent, EventBus};
pub use import::ImportResult;
pub use pool::{ExtraPool, OrphanRemoval};
