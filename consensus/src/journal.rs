//! Undo journal for chain mutations.
//!
//! An import or a promotion pass writes to the block store, the orphan
//! store, the address index and in-memory state, and none of those share a
//! transaction. Inside [`ChainCore::atomically`] every successful write
//! records how to revert it. If the mutation fails the entries are replayed
//! newest first and the counters and tip are put back, so a failed tick or
//! import leaves the chain as it found it. Events are held back until the
//! mutation succeeds.

use tracing::warn;
use xdag_store::StoreError;
use xdag_types::{AccountId, Block, BlockInfo, HashLow, XAmount, XdagTime};

use crate::ConsensusError;
use crate::events::ChainEvent;
use crate::state::ChainCore;

/// How to revert one write.
#[derive(Debug)]
pub(crate) enum Undo {
    /// Put back a block's previous info.
    Info(BlockInfo),
    /// Forget a block that was newly persisted.
    Stored(HashLow),
    /// Take a block back out of the extra pool.
    Pooled(HashLow),
    /// Return a block to the extra pool at its old position.
    Unpooled(usize, Block),
    OrphanAdded(HashLow),
    OrphanDeleted(HashLow, XdagTime),
    Account(AccountId, XAmount),
    Total(XAmount),
    Owned(HashLow),
    Disowned(HashLow),
    MainSet(u64, XdagTime),
    MainUnset(u64, XdagTime),
    /// Counters and tip were persisted and published.
    Status,
}

#[derive(Debug, Default)]
pub(crate) struct Journal {
    undo: Vec<Undo>,
    events: Vec<ChainEvent>,
}

impl ChainCore {
    /// Run `f` as one all-or-nothing mutation.
    pub(crate) fn atomically<T, F>(&mut self, f: F) -> Result<T, ConsensusError>
    where
        F: FnOnce(&mut Self) -> Result<T, ConsensusError>,
    {
        let stats = self.stats.clone();
        let top = self.top.clone();
        self.journal = Some(Journal::default());

        let result = f(self);
        let journal = self.journal.take().unwrap_or_default();
        match result {
            Ok(value) => {
                for event in &journal.events {
                    self.events.emit(event);
                }
                Ok(value)
            }
            Err(e) => {
                self.stats = stats;
                self.top = top;
                self.roll_back(journal.undo);
                Err(e)
            }
        }
    }

    pub(crate) fn record(&mut self, entry: Undo) {
        if let Some(journal) = self.journal.as_mut() {
            journal.undo.push(entry);
        }
    }

    pub(crate) fn is_journaling(&self) -> bool {
        self.journal.is_some()
    }

    /// Emit now, or once the running mutation succeeds.
    pub(crate) fn emit(&mut self, event: ChainEvent) {
        match self.journal.as_mut() {
            Some(journal) => journal.events.push(event),
            None => self.events.emit(&event),
        }
    }

    fn roll_back(&mut self, undo: Vec<Undo>) {
        let entries = undo.len();
        let mut failed = 0usize;
        for entry in undo.into_iter().rev() {
            if let Err(e) = self.revert(entry) {
                failed += 1;
                warn!(error = %e, "rollback write failed");
            }
        }
        warn!(entries, failed, nmain = self.stats.nmain, "chain mutation rolled back");
    }

    fn revert(&mut self, entry: Undo) -> Result<(), StoreError> {
        match entry {
            Undo::Info(info) => {
                {
                    let mut extra = self.shared.extra.write();
                    if let Some(block) = extra.get_mut(&info.hashlow) {
                        block.info = info;
                        return Ok(());
                    }
                }
                self.store.save_block_info(&info)
            }
            Undo::Stored(hashlow) => self.store.remove_block(&hashlow),
            Undo::Pooled(hashlow) => {
                self.shared.extra.write().remove(&hashlow);
                Ok(())
            }
            Undo::Unpooled(index, block) => {
                self.shared.extra.write().restore(index, block);
                Ok(())
            }
            Undo::OrphanAdded(hashlow) => self.orphans.delete(&hashlow).map(|_| ()),
            Undo::OrphanDeleted(hashlow, timestamp) => self.orphans.add(&hashlow, timestamp),
            Undo::Account(account, balance) => self.addresses.update_balance(&account, balance),
            Undo::Total(total) => self.addresses.set_total_balance(total),
            Undo::Owned(hashlow) => {
                self.shared.ours.write().remove(&hashlow);
                Ok(())
            }
            Undo::Disowned(hashlow) => {
                self.shared.ours.write().insert(hashlow);
                Ok(())
            }
            Undo::MainSet(height, timestamp) => {
                self.pow.on_main_unset(height, timestamp);
                Ok(())
            }
            Undo::MainUnset(height, timestamp) => {
                self.pow.on_main_set(height, timestamp);
                Ok(())
            }
            Undo::Status => {
                self.store.save_stats(&self.stats)?;
                self.store.save_top_status(&self.top)?;
                *self.shared.stats.write() = self.stats.clone();
                *self.shared.top.write() = self.top.clone();
                Ok(())
            }
        }
    }
}
