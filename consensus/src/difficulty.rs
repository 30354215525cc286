//! Block weight and cumulative difficulty.

use xdag_types::{Block, Difficulty, HashLow};
use xdag_work::hash_to_weight;

use crate::ConsensusError;
use crate::state::ChainCore;

impl ChainCore {
    /// Weight a block adds on its own.
    ///
    /// Transaction blocks weigh 1. A round-closing block whose epoch is past
    /// the RandomX fork is weighed by its PoW hash; everything else by its
    /// block hash.
    pub(crate) fn self_weight(&self, block: &Block) -> Result<Difficulty, ConsensusError> {
        if block.is_transaction() {
            return Ok(Difficulty::one());
        }
        if block.timestamp.is_end_of_round() {
            let epoch = self.pow.current_epoch(block.timestamp);
            if self.pow.is_fork_active(epoch) {
                let digest = self.pow.hash(&block.payload, epoch)?;
                return Ok(hash_to_weight(&digest));
            }
        }
        Ok(hash_to_weight(block.hash().as_bytes()))
    }

    /// Cumulative difficulty of `block` and its heaviest predecessor.
    ///
    /// A link into an earlier round contributes its difficulty plus the self
    /// weight. A same-round link contributes at least its own difficulty, or
    /// the difficulty of its first earlier-round ancestor plus the self
    /// weight if that is more, so weight is counted once per round.
    pub(crate) fn propagate(
        &self,
        block: &Block,
        self_weight: Difficulty,
    ) -> Result<(Difficulty, Option<HashLow>), ConsensusError> {
        let round = block.round();
        let mut max_diff = self_weight;
        let mut max_diff_link = None;

        for (target, _) in block.block_links() {
            let linked = self.require_info(&target)?;
            let candidate = if linked.round() < round {
                linked.difficulty.saturating_add(self_weight)
            } else {
                let mut candidate = linked.difficulty;
                let mut cursor = linked.max_diff_link;
                while let Some(h) = cursor {
                    let ancestor = self.require_info(&h)?;
                    if ancestor.round() < round {
                        let via = ancestor.difficulty.saturating_add(self_weight);
                        if via > candidate {
                            candidate = via;
                        }
                        break;
                    }
                    cursor = ancestor.max_diff_link;
                }
                candidate
            };
            if candidate > max_diff {
                max_diff = candidate;
                max_diff_link = Some(target);
            }
        }
        Ok((max_diff, max_diff_link))
    }
}
