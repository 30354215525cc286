//! The single-writer chain state.
//!
//! [`ChainCore`] is only ever touched with the facade's writer lock held. The
//! pieces readers need without that lock (extra pool, ownership index, tip and
//! counters) live in [`SharedState`] behind their own short-lived locks.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use xdag_crypto::AuthorizationVerifier;
use xdag_ledger::{LedgerError, LedgerView};
use xdag_store::{AddressStore, BlockStore, OrphanStore, StoreError, TxHistoryStore};
use xdag_types::{
    AccountId, Block, BlockInfo, ChainParams, Clock, HashLow, PublicKey, XAmount, XdagStats,
    XdagTopStatus,
};
use xdag_work::PowProvider;

use crate::ConsensusError;
use crate::events::EventBus;
use crate::journal::{Journal, Undo};
use crate::pool::ExtraPool;

/// State shared between the writer and concurrent readers.
pub(crate) struct SharedState {
    pub(crate) extra: RwLock<ExtraPool>,
    /// Hashlows of locally owned blocks.
    pub(crate) ours: RwLock<HashSet<HashLow>>,
    pub(crate) stats: RwLock<XdagStats>,
    pub(crate) top: RwLock<XdagTopStatus>,
}

pub(crate) struct ChainCore {
    pub(crate) params: ChainParams,
    pub(crate) store: Arc<dyn BlockStore>,
    pub(crate) addresses: Arc<dyn AddressStore>,
    pub(crate) orphans: Arc<dyn OrphanStore>,
    pub(crate) history: Arc<dyn TxHistoryStore>,
    pub(crate) pow: Arc<dyn PowProvider>,
    pub(crate) verifier: Arc<dyn AuthorizationVerifier>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) local_keys: HashSet<PublicKey>,
    pub(crate) shared: Arc<SharedState>,
    pub(crate) events: Arc<EventBus>,
    pub(crate) stats: XdagStats,
    pub(crate) top: XdagTopStatus,
    /// Present while an [`atomically`](ChainCore::atomically) mutation runs.
    pub(crate) journal: Option<Journal>,
}

impl ChainCore {
    /// Full block from the extra pool or the store.
    pub(crate) fn load_block(&self, hashlow: &HashLow) -> Result<Option<Block>, StoreError> {
        if let Some(block) = self.shared.extra.read().get(hashlow) {
            return Ok(Some(block.clone()));
        }
        self.store.get_block(hashlow)
    }

    pub(crate) fn load_info(&self, hashlow: &HashLow) -> Result<Option<BlockInfo>, StoreError> {
        if let Some(block) = self.shared.extra.read().get(hashlow) {
            return Ok(Some(block.info.clone()));
        }
        self.store.get_block_info(hashlow)
    }

    pub(crate) fn require_info(&self, hashlow: &HashLow) -> Result<BlockInfo, ConsensusError> {
        self.load_info(hashlow)?
            .ok_or(ConsensusError::MissingBlock(*hashlow))
    }

    /// Write back block info to wherever the block lives. Balance changes on
    /// locally owned blocks are mirrored into `stats.balance`.
    pub(crate) fn store_info(&mut self, info: BlockInfo) -> Result<(), LedgerError> {
        let previous = if info.flags.is_ours() || self.is_journaling() {
            self.load_info(&info.hashlow)?
        } else {
            None
        };
        if info.flags.is_ours() {
            if let Some(old) = &previous {
                let delta = info.amount.checked_sub(old.amount)?;
                if !delta.is_zero() {
                    self.stats.balance = self.stats.balance.checked_add(delta)?;
                }
            }
        }
        let pooled = {
            let mut extra = self.shared.extra.write();
            match extra.get_mut(&info.hashlow) {
                Some(block) => {
                    block.info = info.clone();
                    true
                }
                None => false,
            }
        };
        if !pooled {
            self.store.save_block_info(&info)?;
        }
        if let Some(previous) = previous {
            self.record(Undo::Info(previous));
        }
        Ok(())
    }

    /// Load, modify and store one block's info.
    pub(crate) fn modify_info<F>(&mut self, hashlow: &HashLow, f: F) -> Result<BlockInfo, ConsensusError>
    where
        F: FnOnce(&mut BlockInfo),
    {
        let mut info = self.require_info(hashlow)?;
        f(&mut info);
        self.store_info(info.clone())?;
        Ok(info)
    }

    /// Persist counters and tip, then publish them to readers.
    pub(crate) fn save_status(&mut self) -> Result<(), ConsensusError> {
        self.stats.totalnblocks = self.stats.totalnblocks.max(self.stats.nblocks);
        self.record(Undo::Status);
        self.store.save_stats(&self.stats)?;
        self.store.save_top_status(&self.top)?;
        *self.shared.stats.write() = self.stats.clone();
        *self.shared.top.write() = self.top.clone();
        Ok(())
    }
}

impl LedgerView for ChainCore {
    fn block(&self, hashlow: &HashLow) -> Result<Block, LedgerError> {
        self.load_block(hashlow)?
            .ok_or(LedgerError::MissingBlock(*hashlow))
    }

    fn info(&self, hashlow: &HashLow) -> Result<BlockInfo, LedgerError> {
        self.load_info(hashlow)?
            .ok_or(LedgerError::MissingBlock(*hashlow))
    }

    fn save_info(&mut self, info: BlockInfo) -> Result<(), LedgerError> {
        self.store_info(info)
    }

    fn account_balance(&self, account: &AccountId) -> Result<XAmount, LedgerError> {
        Ok(self.addresses.balance_of(account)?)
    }

    fn set_account_balance(
        &mut self,
        account: &AccountId,
        balance: XAmount,
    ) -> Result<(), LedgerError> {
        let previous = self.addresses.balance_of(account)?;
        self.addresses.update_balance(account, balance)?;
        self.record(Undo::Account(*account, previous));
        Ok(())
    }

    fn total_balance(&self) -> Result<XAmount, LedgerError> {
        Ok(self.addresses.total_balance()?)
    }

    fn set_total_balance(&mut self, total: XAmount) -> Result<(), LedgerError> {
        let previous = self.addresses.total_balance()?;
        self.addresses.set_total_balance(total)?;
        self.record(Undo::Total(previous));
        Ok(())
    }
}
