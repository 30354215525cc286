//! Extra pool and orphan bookkeeping.
//!
//! Blocks closing the current round wait in the [`ExtraPool`] (memory only,
//! insertion ordered) until something references them. Every other admitted
//! block that nothing references yet sits in the persistent orphan store.
//! Either way, the first inbound reference clears the orphan status and sets
//! `REF`.

use indexmap::IndexMap;
use tracing::{debug, info};
use xdag_types::{Block, BlockFlag, HashLow};

use crate::ConsensusError;
use crate::events::ChainEvent;
use crate::journal::Undo;
use crate::state::ChainCore;

/// Why a block stops being an orphan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrphanRemoval {
    /// Referenced by a newly admitted block.
    Normal,
    /// Dropped from a full extra pool; the block is discarded, not consumed.
    Reuse,
    /// Referenced by a new extra block. Only pooled targets are unlinked.
    Extra,
}

/// Bounded, insertion-ordered pool of round-closing blocks.
#[derive(Debug)]
pub struct ExtraPool {
    blocks: IndexMap<HashLow, Block>,
    capacity: usize,
}

impl ExtraPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            blocks: IndexMap::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn is_over_capacity(&self) -> bool {
        self.blocks.len() > self.capacity
    }

    pub fn contains(&self, hashlow: &HashLow) -> bool {
        self.blocks.contains_key(hashlow)
    }

    pub fn get(&self, hashlow: &HashLow) -> Option<&Block> {
        self.blocks.get(hashlow)
    }

    pub fn get_mut(&mut self, hashlow: &HashLow) -> Option<&mut Block> {
        self.blocks.get_mut(hashlow)
    }

    /// Append a block. Re-inserting an existing hashlow keeps its position.
    pub fn insert(&mut self, block: Block) {
        self.blocks.insert(block.hashlow(), block);
    }

    /// Remove a block, preserving the order of the rest.
    pub fn remove(&mut self, hashlow: &HashLow) -> Option<Block> {
        self.blocks.shift_remove(hashlow)
    }

    /// Remove a block and report the position it held.
    pub fn remove_indexed(&mut self, hashlow: &HashLow) -> Option<(usize, Block)> {
        self.blocks
            .shift_remove_full(hashlow)
            .map(|(index, _, block)| (index, block))
    }

    /// Put a removed block back at `index` (or last, if the pool shrank).
    pub fn restore(&mut self, index: usize, block: Block) {
        let index = index.min(self.blocks.len());
        self.blocks.shift_insert(index, block.hashlow(), block);
    }

    /// Hashlow of the earliest inserted block.
    pub fn oldest(&self) -> Option<HashLow> {
        self.blocks.first().map(|(hashlow, _)| *hashlow)
    }

    /// Pooled blocks, oldest first.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }
}

impl ChainCore {
    /// Clear the orphan status of `hashlow`.
    ///
    /// A pooled block leaves the pool; unless it is being recycled it is
    /// persisted and everything it links to is unlinked in turn. A stored
    /// orphan leaves the orphan store. Iterative so that long chains of
    /// pooled blocks cannot exhaust the stack.
    ///
    /// Returns the block taken out of the pool by [`OrphanRemoval::Reuse`].
    pub(crate) fn remove_orphan(
        &mut self,
        hashlow: &HashLow,
        reason: OrphanRemoval,
    ) -> Result<Option<Block>, ConsensusError> {
        let mut work = vec![(*hashlow, reason)];
        let mut recycled = None;

        while let Some((target, reason)) = work.pop() {
            let Some(info) = self.load_info(&target)? else {
                continue;
            };
            if info.flags.is_ref() {
                continue;
            }

            if info.flags.is_extra() {
                let removed = self.shared.extra.write().remove_indexed(&target);
                let Some((index, mut block)) = removed else { continue };
                self.record(Undo::Unpooled(index, block.clone()));
                self.stats.nextra = self.stats.nextra.saturating_sub(1);
                if reason == OrphanRemoval::Reuse {
                    recycled = Some(block);
                    continue;
                }
                block.info.flags.set(BlockFlag::Extra, false);
                block.info.flags.set(BlockFlag::Ref, true);
                self.store.put_block(&block)?;
                self.record(Undo::Stored(target));
                debug!(hash = %target, "extra block persisted");
                for (link, _) in block.block_links().rev() {
                    work.push((link, OrphanRemoval::Normal));
                }
                continue;
            }

            if reason == OrphanRemoval::Extra {
                continue;
            }
            let deleted = self.orphans.delete(&target)?;
            if !deleted && self.store.is_snapshot() {
                continue;
            }
            if deleted {
                self.record(Undo::OrphanDeleted(target, info.timestamp));
                self.stats.nnoref = self.stats.nnoref.saturating_sub(1);
            }
            self.modify_info(&target, |info| info.flags.set(BlockFlag::Ref, true))?;
        }
        Ok(recycled)
    }

    /// Drop the oldest extra block once the pool exceeds its capacity.
    ///
    /// The block is forgotten entirely: it no longer counts toward
    /// `nblocks` or `totalnblocks` and leaves the ownership index.
    pub(crate) fn evict_if_over_capacity(&mut self) -> Result<Option<HashLow>, ConsensusError> {
        let oldest = {
            let extra = self.shared.extra.read();
            if !extra.is_over_capacity() {
                return Ok(None);
            }
            extra.oldest()
        };
        let Some(oldest) = oldest else {
            return Ok(None);
        };
        let Some(block) = self.remove_orphan(&oldest, OrphanRemoval::Reuse)? else {
            return Ok(None);
        };

        self.stats.nblocks = self.stats.nblocks.saturating_sub(1);
        self.stats.totalnblocks = self.stats.totalnblocks.saturating_sub(1);
        if block.info.flags.is_ours() {
            self.shared.ours.write().remove(&oldest);
            self.record(Undo::Disowned(oldest));
            self.stats.balance = self.stats.balance.checked_sub(block.info.amount)?;
        }
        info!(
            hash = %oldest,
            round = block.round(),
            nextra = self.stats.nextra,
            "extra pool full, oldest block evicted"
        );
        self.emit(ChainEvent::ExtraEvicted { hash: block.hash() });
        Ok(Some(oldest))
    }
}
