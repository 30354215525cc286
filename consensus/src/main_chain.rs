//! Promotion and demotion of main blocks.

use tracing::{info, warn};
use xdag_ledger::{apply, reward, unapply, ApplyStatus, LedgerView};
use xdag_types::{BlockFlag, BlockInfo, HashLow};

use crate::ConsensusError;
use crate::events::ChainEvent;
use crate::journal::Undo;
use crate::state::ChainCore;

impl ChainCore {
    /// Promote at most one buried main-chain block to main.
    ///
    /// Walks from the top down to the newest main block and picks the
    /// deepest `MAIN_CHAIN` block on the way. It is promoted once something
    /// references it, at least one more path block sits above it, and the
    /// confirmation delay since its timestamp has passed.
    pub(crate) fn check_new_main(&mut self) -> Result<Option<HashLow>, ConsensusError> {
        let mut candidate: Option<BlockInfo> = None;
        let mut depth = 0u64;
        let mut cursor = match self.top.top {
            Some(top) => self.load_info(&top)?,
            None => None,
        };

        while let Some(current) = cursor {
            if current.flags.is_main() {
                break;
            }
            let next = current.max_diff_link;
            if current.flags.is_main_chain() {
                depth += 1;
                candidate = Some(current);
            }
            cursor = match next {
                Some(h) => self.load_info(&h)?,
                None => None,
            };
        }

        let Some(candidate) = candidate else {
            return Ok(None);
        };
        let due = candidate
            .timestamp
            .saturating_add_ticks(self.params.main_confirm_delay_ticks());
        if candidate.flags.is_ref() && depth > 1 && self.clock.now() >= due {
            self.set_main(&candidate.hashlow)?;
            return Ok(Some(candidate.hashlow));
        }
        Ok(None)
    }

    /// Make `hashlow` the next main block: mint its reward and settle
    /// everything it references.
    pub(crate) fn set_main(&mut self, hashlow: &HashLow) -> Result<(), ConsensusError> {
        let height = self.stats.nmain + 1;
        let minted = reward(&self.params, height);

        let info = self.update_info(hashlow, |info| {
            info.height = height;
            info.flags.set(BlockFlag::Main, true);
            info.amount = info.amount.checked_add(minted)?;
            Ok(())
        })?;
        self.stats.nmain = height;

        let outcome = apply(self, hashlow, true)?;
        if outcome.status == ApplyStatus::Rejected {
            warn!(hash = %hashlow, height, "main block transfers rejected");
        }
        let gas = outcome.gas;
        self.update_info(hashlow, |info| {
            if !gas.is_zero() {
                info.amount = info.amount.checked_add(gas)?;
                info.fee = info.fee.checked_add(gas)?;
            }
            info.reference = Some(info.hashlow);
            Ok(())
        })?;

        self.pow.on_main_set(height, info.timestamp);
        self.record(Undo::MainSet(height, info.timestamp));
        info!(hash = %hashlow, height, reward = %minted, fee = %gas, "main block set");
        self.emit(ChainEvent::MainSet {
            hash: info.hash,
            height,
        });
        Ok(())
    }

    /// Demote a main block, taking back its reward and undoing its
    /// settlement.
    pub(crate) fn unset_main(&mut self, hashlow: &HashLow) -> Result<(), ConsensusError> {
        let info = self.require_info(hashlow)?;
        let height = info.height;
        let minted = reward(&self.params, height);

        self.update_info(hashlow, |info| {
            info.flags.set(BlockFlag::Main, false);
            info.amount = info.amount.checked_sub(minted)?;
            Ok(())
        })?;

        let gas = unapply(self, hashlow, true)?;
        self.update_info(hashlow, |info| {
            if !gas.is_zero() {
                info.amount = info.amount.checked_sub(gas)?;
                info.fee = info.fee.checked_sub(gas)?;
            }
            info.height = 0;
            Ok(())
        })?;
        self.stats.nmain = self.stats.nmain.saturating_sub(1);

        self.pow.on_main_unset(height, info.timestamp);
        self.record(Undo::MainUnset(height, info.timestamp));
        info!(hash = %hashlow, height, "main block unset");
        self.emit(ChainEvent::MainUnset {
            hash: info.hash,
            height,
        });
        Ok(())
    }
}
