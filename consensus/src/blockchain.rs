//! The consensus facade.
//!
//! Every mutation (import, fork choice, promotion, settlement) runs with the
//! writer lock held, so none of them interleave. Queries read the shared
//! snapshots and the stores directly and never wait for the writer.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};
use xdag_crypto::AuthorizationVerifier;
use xdag_ledger::{reward, supply};
use xdag_store::{AddressStore, BlockStore, OrphanStore, TxHistoryStore};
use xdag_types::{
    AccountId, AmountError, Block, ChainParams, Clock, HashLow, PublicKey, XAmount, XdagStats,
    XdagTopStatus,
};
use xdag_work::PowProvider;

use crate::ConsensusError;
use crate::events::{ChainEvent, EventBus};
use crate::import::ImportResult;
use crate::pool::ExtraPool;
use crate::state::{ChainCore, SharedState};

/// External collaborators the chain is built on.
#[derive(Clone)]
pub struct ChainCollaborators {
    pub store: Arc<dyn BlockStore>,
    pub addresses: Arc<dyn AddressStore>,
    pub orphans: Arc<dyn OrphanStore>,
    pub history: Arc<dyn TxHistoryStore>,
    pub pow: Arc<dyn PowProvider>,
    pub verifier: Arc<dyn AuthorizationVerifier>,
    pub clock: Arc<dyn Clock>,
}

pub struct Blockchain {
    params: ChainParams,
    core: Mutex<ChainCore>,
    shared: Arc<SharedState>,
    events: Arc<EventBus>,
    store: Arc<dyn BlockStore>,
    addresses: Arc<dyn AddressStore>,
}

impl Blockchain {
    /// Open a chain over `collaborators`, resuming persisted counters and
    /// tip. Blocks signed by any of `local_keys` are tracked as ours.
    pub fn new(
        params: ChainParams,
        collaborators: ChainCollaborators,
        local_keys: Vec<PublicKey>,
    ) -> Result<Self, ConsensusError> {
        let ChainCollaborators {
            store,
            addresses,
            orphans,
            history,
            pow,
            verifier,
            clock,
        } = collaborators;

        let mut stats = store.load_stats()?.unwrap_or_default();
        // The extra pool lives in memory and does not survive a restart.
        stats.nblocks = stats.nblocks.saturating_sub(stats.nextra);
        stats.nextra = 0;
        let top = store.load_top_status()?.unwrap_or_default();

        let shared = Arc::new(SharedState {
            extra: RwLock::new(ExtraPool::new(params.max_allowed_extra)),
            ours: RwLock::new(HashSet::new()),
            stats: RwLock::new(stats.clone()),
            top: RwLock::new(top.clone()),
        });
        let events = Arc::new(EventBus::new());

        info!(
            network = params.network.as_str(),
            nmain = stats.nmain,
            nblocks = stats.nblocks,
            "chain opened"
        );

        let core = ChainCore {
            params: params.clone(),
            store: store.clone(),
            addresses: addresses.clone(),
            orphans,
            history,
            pow,
            verifier,
            clock,
            local_keys: local_keys.into_iter().collect(),
            shared: shared.clone(),
            events: events.clone(),
            stats,
            top,
            journal: None,
        };

        Ok(Self {
            params,
            core: Mutex::new(core),
            shared,
            events,
            store,
            addresses,
        })
    }

    /// Admit a block. Never fails: every outcome, including internal
    /// errors, is an [`ImportResult`].
    pub fn import_block(&self, block: Block) -> ImportResult {
        self.core.lock().import(block)
    }

    /// Run one promotion pass. Returns the block promoted to main, if any.
    pub fn check_new_main(&self) -> Result<Option<HashLow>, ConsensusError> {
        self.core.lock().atomically(|core| {
            let promoted = core.check_new_main()?;
            if promoted.is_some() {
                core.save_status()?;
            }
            Ok(promoted)
        })
    }

    /// Block by hashlow, from the extra pool or the store.
    pub fn get_block_by_hash(&self, hashlow: &HashLow) -> Result<Option<Block>, ConsensusError> {
        if let Some(block) = self.shared.extra.read().get(hashlow) {
            return Ok(Some(block.clone()));
        }
        Ok(self.store.get_block(hashlow)?)
    }

    /// Main block at `height`.
    pub fn get_block_by_height(&self, height: u64) -> Result<Option<Block>, ConsensusError> {
        Ok(self.store.get_block_by_height(height)?)
    }

    /// Up to `count` main blocks, newest first.
    pub fn list_main_blocks(&self, count: usize) -> Result<Vec<Block>, ConsensusError> {
        let nmain = self.shared.stats.read().nmain;
        let mut blocks = Vec::with_capacity(count.min(nmain as usize));
        for height in (1..=nmain).rev().take(count) {
            match self.store.get_block_by_height(height)? {
                Some(block) => blocks.push(block),
                // A concurrent demotion shortened the chain.
                None => debug!(height, "main block vanished during listing"),
            }
        }
        Ok(blocks)
    }

    /// Depth of the main block that settled `hashlow`: 1 for the newest
    /// main block, growing as more are promoted. `None` while no main block
    /// has settled it.
    pub fn confirmations(&self, hashlow: &HashLow) -> Result<Option<u64>, ConsensusError> {
        let nmain = self.shared.stats.read().nmain;
        let mut seen = HashSet::new();
        let mut cursor = *hashlow;
        // Settled blocks point at their consumer; consumers lead to a main block.
        while seen.insert(cursor) {
            let pooled = self.shared.extra.read().get(&cursor).map(|b| b.info.clone());
            let info = match pooled {
                Some(info) => info,
                None => match self.store.get_block_info(&cursor)? {
                    Some(info) => info,
                    None => return Ok(None),
                },
            };
            if info.flags.is_main() {
                return Ok(Some(nmain.saturating_sub(info.height) + 1));
            }
            match info.reference {
                Some(next) => cursor = next,
                None => return Ok(None),
            }
        }
        Ok(None)
    }

    /// Whether `hashlow` is settled at least `confirmations_count` main
    /// blocks deep.
    pub fn is_confirmed(&self, hashlow: &HashLow) -> Result<bool, ConsensusError> {
        Ok(self
            .confirmations(hashlow)?
            .is_some_and(|depth| depth >= self.params.confirmations_count))
    }

    /// Blocks waiting in the extra pool, oldest first.
    pub fn list_extra_blocks(&self) -> Vec<Block> {
        self.shared.extra.read().blocks().cloned().collect()
    }

    pub fn balance_of(&self, account: &AccountId) -> Result<XAmount, ConsensusError> {
        Ok(self.addresses.balance_of(account)?)
    }

    pub fn is_ours(&self, hashlow: &HashLow) -> bool {
        self.shared.ours.read().contains(hashlow)
    }

    pub fn stats(&self) -> XdagStats {
        self.shared.stats.read().clone()
    }

    pub fn top_status(&self) -> XdagTopStatus {
        self.shared.top.read().clone()
    }

    /// Reward minted by the main block at `height`.
    pub fn reward(&self, height: u64) -> XAmount {
        reward(&self.params, height)
    }

    /// Coins minted by the first `height` main blocks.
    pub fn supply(&self, height: u64) -> Result<XAmount, AmountError> {
        supply(&self.params, height)
    }

    pub fn subscribe(&self, listener: Box<dyn Fn(&ChainEvent) + Send + Sync>) {
        self.events.subscribe(listener);
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }
}
