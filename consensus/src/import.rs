//! Block admission.
//!
//! Checks run fail-fast in a fixed order: network tag, timestamp window,
//! duplicates, link validity, input authorization. An admitted block is
//! weighed, stored (or pooled if it closes its round), unlinks the orphans
//! it references and may move the top.

use std::collections::HashSet;

use tracing::{debug, warn};
use xdag_crypto::account_id_from_public_key;
use xdag_store::TxHistory;
use xdag_types::{Address, Block, BlockFlag, BlockInfo, HashLow, LinkKind, LinkTarget, PublicKey, XAmount};

use crate::ConsensusError;
use crate::events::ChainEvent;
use crate::journal::Undo;
use crate::pool::OrphanRemoval;
use crate::state::ChainCore;

/// Outcome of [`Blockchain::import_block`](crate::Blockchain::import_block).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImportResult {
    /// Admitted and now the top.
    ImportedCanonical,
    /// Admitted without moving the top.
    ImportedSideChain,
    /// Type tag of another network.
    MalformedType,
    /// Too far in the future, or before the chain start.
    TimestampOutOfRange,
    /// Already persisted.
    AlreadyExists,
    /// Already waiting in the extra pool.
    AlreadyPending,
    /// A referenced block is unknown.
    MissingParent(HashLow),
    InvalidBlock { hash: HashLow, reason: String },
    /// An unexpected failure; the block was not admitted.
    InternalError(String),
}

impl ImportResult {
    pub fn is_imported(&self) -> bool {
        matches!(self, Self::ImportedCanonical | Self::ImportedSideChain)
    }

    /// Short label, stable for metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ImportedCanonical => "imported_canonical",
            Self::ImportedSideChain => "imported_side_chain",
            Self::MalformedType => "malformed_type",
            Self::TimestampOutOfRange => "timestamp_out_of_range",
            Self::AlreadyExists => "already_exists",
            Self::AlreadyPending => "already_pending",
            Self::MissingParent(_) => "missing_parent",
            Self::InvalidBlock { .. } => "invalid_block",
            Self::InternalError(_) => "internal_error",
        }
    }
}

fn invalid(hash: HashLow, reason: impl Into<String>) -> ImportResult {
    ImportResult::InvalidBlock {
        hash,
        reason: reason.into(),
    }
}

impl ChainCore {
    pub(crate) fn import(&mut self, block: Block) -> ImportResult {
        let hashlow = block.hashlow();
        let result = match self.atomically(|core| core.try_import(block)) {
            Ok(result) => result,
            Err(e) => {
                warn!(hash = %hashlow, error = %e, "block import failed");
                ImportResult::InternalError(e.to_string())
            }
        };
        debug!(hash = %hashlow, result = result.as_str(), "block import finished");
        result
    }

    fn try_import(&mut self, block: Block) -> Result<ImportResult, ConsensusError> {
        let hashlow = block.hashlow();

        if block.type_tag != self.params.network.block_type_tag() {
            return Ok(ImportResult::MalformedType);
        }

        let latest = self
            .clock
            .now()
            .saturating_add_ticks(self.params.max_future_ticks);
        if block.timestamp > latest || block.timestamp < self.params.start_time {
            return Ok(ImportResult::TimestampOutOfRange);
        }

        if self.store.has_block(&hashlow)? {
            return Ok(ImportResult::AlreadyExists);
        }
        if self.shared.extra.read().contains(&hashlow) {
            return Ok(ImportResult::AlreadyPending);
        }

        let is_extra = block.is_round_closing();

        if let Some(rejection) = self.validate_links(&block)? {
            return Ok(rejection);
        }
        if let Some(rejection) = self.authorize_inputs(&block)? {
            return Ok(rejection);
        }

        self.commit(block, is_extra)
    }

    /// Link checks. Returns the rejection if any link is unacceptable.
    fn validate_links(&self, block: &Block) -> Result<Option<ImportResult>, ConsensusError> {
        let hashlow = block.hashlow();
        let mut sum_in = XAmount::ZERO;
        let mut sum_out = XAmount::ZERO;

        for link in &block.links {
            if !link.is_well_formed() {
                return Ok(Some(invalid(hashlow, "malformed link")));
            }
            if link.amount.is_negative() {
                return Ok(Some(invalid(hashlow, "negative link amount")));
            }
            match link.target {
                LinkTarget::Block(target) => {
                    let Some(linked) = self.load_info(&target)? else {
                        return Ok(Some(ImportResult::MissingParent(target)));
                    };
                    if linked.timestamp >= block.timestamp {
                        return Ok(Some(invalid(hashlow, "reference is not older than block")));
                    }
                }
                LinkTarget::Account(account) if link.kind == LinkKind::Input => {
                    if !self.addresses.address_exists(&account)? {
                        return Ok(Some(invalid(hashlow, "input from unknown account")));
                    }
                    if link.amount < self.params.min_gas {
                        return Ok(Some(invalid(hashlow, "input below minimum gas")));
                    }
                }
                LinkTarget::Account(_) => {}
            }

            let sum = if link.kind.is_input() {
                &mut sum_in
            } else {
                &mut sum_out
            };
            match sum.checked_add(link.amount) {
                Ok(total) => *sum = total,
                Err(e) => return Ok(Some(invalid(hashlow, format!("link amounts: {e}")))),
            }
        }
        Ok(None)
    }

    /// Every input must be authorized by a key that may spend it: the
    /// source block's keys for block inputs, the block's own keys deriving
    /// to the account for account inputs.
    fn authorize_inputs(&self, block: &Block) -> Result<Option<ImportResult>, ConsensusError> {
        for link in block.links.iter().filter(|l| l.kind.is_input()) {
            let candidates = self.candidate_keys(block, link)?;
            if !self.verifier.verify(block, link, &candidates) {
                return Ok(Some(invalid(block.hashlow(), "unauthorized input")));
            }
        }
        Ok(None)
    }

    fn candidate_keys(&self, block: &Block, link: &Address) -> Result<Vec<PublicKey>, ConsensusError> {
        match link.target {
            LinkTarget::Block(source) => Ok(self
                .load_block(&source)?
                .map(|b| b.public_keys)
                .unwrap_or_default()),
            LinkTarget::Account(account) => Ok(block
                .public_keys
                .iter()
                .filter(|k| account_id_from_public_key(k) == account)
                .copied()
                .collect()),
        }
    }

    fn commit(&mut self, mut block: Block, is_extra: bool) -> Result<ImportResult, ConsensusError> {
        let hashlow = block.hashlow();
        let hash = block.hash();
        let ours = block.public_keys.iter().any(|k| self.local_keys.contains(k));

        let mut info = BlockInfo::new(block.hash(), block.timestamp);
        if let Some(remark) = block.info.remark.take() {
            info.remark = Some(remark);
            info.flags.set(BlockFlag::Remark, true);
        }
        info.flags.set(BlockFlag::Ours, ours);
        info.flags.set(BlockFlag::Extra, is_extra);

        let weight = self.self_weight(&block)?;
        let (difficulty, max_diff_link) = self.propagate(&block, weight)?;
        info.difficulty = difficulty;
        info.max_diff_link = max_diff_link;
        block.info = info;

        let round = block.round();
        let timestamp = block.timestamp;
        let targets: Vec<HashLow> = {
            let mut seen = HashSet::new();
            block
                .block_links()
                .map(|(target, _)| target)
                .filter(|target| seen.insert(*target))
                .collect()
        };
        let history: Vec<TxHistory> = block
            .links
            .iter()
            .filter(|link| !link.amount.is_zero())
            .map(|link| TxHistory {
                target: link.target,
                block_hash: hash,
                direction: link.kind,
                amount: link.amount,
                timestamp,
                remark: block.info.remark.clone(),
            })
            .collect();

        if is_extra {
            self.shared.extra.write().insert(block);
            self.record(Undo::Pooled(hashlow));
            self.stats.nextra += 1;
        } else {
            self.store.put_block(&block)?;
            self.record(Undo::Stored(hashlow));
            self.orphans.add(&hashlow, timestamp)?;
            self.record(Undo::OrphanAdded(hashlow));
            self.stats.nnoref += 1;
        }
        self.stats.nblocks += 1;
        self.stats.record_hashrate(round, weight, ours);

        let removal = if is_extra {
            OrphanRemoval::Extra
        } else {
            OrphanRemoval::Normal
        };
        for target in &targets {
            self.remove_orphan(target, removal)?;
        }

        if self.params.promote_on_import {
            self.check_new_main()?;
        }

        if ours && self.shared.ours.write().insert(hashlow) {
            self.record(Undo::Owned(hashlow));
        }

        let canonical = self.try_promote_top(&hashlow)?;
        if let Some(evicted) = self.evict_if_over_capacity()? {
            debug!(admitted = %hashlow, evicted = %evicted, "admission overflowed the extra pool");
        }
        self.save_status()?;
        // Append-only, so written after everything that can be rolled back.
        for entry in &history {
            self.history.record(entry)?;
        }

        let result = if canonical {
            ImportResult::ImportedCanonical
        } else {
            ImportResult::ImportedSideChain
        };
        debug!(
            hash = %hashlow,
            difficulty = %difficulty,
            extra = is_extra,
            links = targets.len(),
            "block admitted"
        );
        self.emit(ChainEvent::BlockImported {
            hash,
            result: result.clone(),
        });
        Ok(result)
    }
}
