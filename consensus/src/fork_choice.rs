//! Top selection and main-chain path maintenance.
//!
//! The main-chain path is the `max_diff_link` chain below the top, with at
//! most one block per round flagged `MAIN_CHAIN`. When a heavier block
//! arrives the path is rewound to the fork point and re-marked along the
//! new block's ancestry.

use tracing::{debug, info};
use xdag_types::{BlockFlag, BlockInfo, HashLow};

use crate::ConsensusError;
use crate::events::ChainEvent;
use crate::state::ChainCore;

impl ChainCore {
    /// Make `hashlow` the top if it is strictly heavier than the current one.
    /// Returns whether the top moved.
    pub(crate) fn try_promote_top(&mut self, hashlow: &HashLow) -> Result<bool, ConsensusError> {
        let candidate = self.require_info(hashlow)?;
        if candidate.difficulty <= self.top.top_diff {
            return Ok(false);
        }

        let height_before = self.stats.nmain;
        let fix_fork = self.stats.nmain >= self.params.fork_fix_height;
        let ancestor = self.find_ancestor(hashlow, fix_fork)?;
        self.unwind_main(ancestor)?;
        if fix_fork {
            self.update_new_chain(hashlow)?;
        }
        if self.stats.nmain < height_before {
            info!(
                from = height_before,
                to = self.stats.nmain,
                "main chain rolled back by reorganization"
            );
        }

        self.record_pre_top(&candidate)?;
        self.top.top = Some(*hashlow);
        self.top.top_diff = candidate.difficulty;
        self.stats.difficulty = candidate.difficulty;
        if candidate.difficulty > self.stats.maxdifficulty {
            self.stats.maxdifficulty = candidate.difficulty;
        }
        debug!(hash = %hashlow, difficulty = %candidate.difficulty, "new top");
        self.emit(ChainEvent::NewTop {
            hash: candidate.hash,
            difficulty: candidate.difficulty,
        });
        Ok(true)
    }

    /// Keep the outgoing top as the fallback if it belongs to an earlier
    /// round than the new top and outweighs the stored fallback.
    fn record_pre_top(&mut self, new_top: &BlockInfo) -> Result<(), ConsensusError> {
        let Some(old) = self.top.top else {
            return Ok(());
        };
        let Some(old_info) = self.load_info(&old)? else {
            return Ok(());
        };
        if old_info.round() < new_top.round()
            && (self.top.pre_top.is_none() || self.top.top_diff > self.top.pre_top_diff)
        {
            self.top.pre_top = Some(old);
            self.top.pre_top_diff = self.top.top_diff;
        }
        Ok(())
    }

    /// Walk `max_diff_link` from `start` until a `MAIN_CHAIN` block.
    ///
    /// Along the way one block per round is selected: the first one met in
    /// each round, provided it is heavier than its predecessor. With `mark`
    /// set the selected blocks get `MAIN_CHAIN`. Returns the stopping block
    /// (`None` past the oldest block) and the last selected block.
    fn walk_new_chain(
        &mut self,
        start: &HashLow,
        mark: bool,
    ) -> Result<(Option<BlockInfo>, Option<BlockInfo>), ConsensusError> {
        let mut cursor = self.load_info(start)?;
        let mut last_selected: Option<BlockInfo> = None;

        while let Some(current) = cursor {
            if current.flags.is_main_chain() {
                return Ok((Some(current), last_selected));
            }
            let predecessor = match current.max_diff_link {
                Some(h) => self.load_info(&h)?,
                None => None,
            };
            let heavier = predecessor
                .as_ref()
                .is_none_or(|p| current.difficulty > p.difficulty);
            let new_round = last_selected
                .as_ref()
                .is_none_or(|s| s.round() > current.round());
            if heavier && new_round {
                if mark {
                    self.modify_info(&current.hashlow, |i| i.flags.set(BlockFlag::MainChain, true))?;
                }
                last_selected = Some(current);
            }
            cursor = predecessor;
        }
        Ok((None, last_selected))
    }

    /// Fork point between the main-chain path and the ancestry of `start`.
    ///
    /// Before the fork-fix height the new path is marked during this walk.
    /// If the fork point shares a round with the lowest selected block of
    /// the new path, the fork point itself is rewound too.
    pub(crate) fn find_ancestor(
        &mut self,
        start: &HashLow,
        fix_fork: bool,
    ) -> Result<Option<HashLow>, ConsensusError> {
        let (stop, lowest) = self.walk_new_chain(start, !fix_fork)?;
        let Some(stop) = stop else {
            return Ok(None);
        };
        match lowest {
            Some(lowest) if lowest.round() == stop.round() => Ok(stop.max_diff_link),
            _ => Ok(Some(stop.hashlow)),
        }
    }

    /// Mark the path below `start` as `MAIN_CHAIN`.
    pub(crate) fn update_new_chain(&mut self, start: &HashLow) -> Result<(), ConsensusError> {
        self.walk_new_chain(start, true)?;
        Ok(())
    }

    /// Clear the path from the current top down to `ancestor` (exclusive),
    /// demoting any main block met on the way.
    pub(crate) fn unwind_main(&mut self, ancestor: Option<HashLow>) -> Result<(), ConsensusError> {
        let mut cursor = self.top.top;
        while let Some(h) = cursor {
            if Some(h) == ancestor {
                break;
            }
            let Some(current) = self.load_info(&h)? else {
                break;
            };
            self.modify_info(&h, |i| i.flags.set(BlockFlag::MainChain, false))?;
            if current.flags.is_main() {
                self.unset_main(&h)?;
            }
            cursor = current.max_diff_link;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::testkit::*;
    use xdag_types::ChainParams;

    fn main_chain(t: &TestChain, id: u32, k: u32) -> bool {
        t.info(&hl(id, k)).flags.is_main_chain()
    }

    #[test]
    fn heavier_block_becomes_top_and_marks_path() {
        let t = TestChain::new();
        t.chain.import_block(block(1, 40, 10, vec![]));
        t.chain.import_block(block(2, 40, 11, refs(&[hl(1, 40)])));
        assert_eq!(t.top(), Some(hl(2, 40)));
        assert!(main_chain(&t, 1, 40));
        assert!(main_chain(&t, 2, 40));
    }

    #[test]
    fn fork_unwinds_losing_branch() {
        let t = TestChain::new();
        t.chain.import_block(block(1, 40, 10, vec![]));
        t.chain.import_block(block(2, 40, 11, refs(&[hl(1, 40)])));
        t.chain.import_block(block(3, 30, 11, refs(&[hl(1, 40)])));

        assert_eq!(t.top(), Some(hl(3, 30)));
        assert!(main_chain(&t, 1, 40));
        assert!(!main_chain(&t, 2, 40));
        assert!(main_chain(&t, 3, 30));
    }

    #[test]
    fn equal_difficulty_does_not_move_top() {
        let t = TestChain::new();
        t.chain.import_block(block(1, 40, 10, vec![]));
        t.chain.import_block(block(2, 40, 11, refs(&[hl(1, 40)])));
        t.chain.import_block(block(3, 40, 11, refs(&[hl(1, 40)])));
        assert_eq!(t.top(), Some(hl(2, 40)));
        assert!(!main_chain(&t, 3, 40));
    }

    #[test]
    fn lighter_block_stays_side_chain() {
        let t = TestChain::new();
        t.chain.import_block(block(1, 40, 10, vec![]));
        t.chain.import_block(block(2, 40, 11, refs(&[hl(1, 40)])));
        t.chain.import_block(block(3, 50, 11, refs(&[hl(1, 40)])));
        assert_eq!(t.top(), Some(hl(2, 40)));
        let status = t.chain.top_status();
        assert_eq!(status.top_diff, t.info(&hl(2, 40)).difficulty);
    }

    #[test]
    fn same_round_extension_keeps_one_main_chain_block_per_round() {
        let t = TestChain::new();
        t.chain.import_block(block(1, 40, 10, vec![]));
        t.chain.import_block(block(2, 50, 11, refs(&[hl(1, 40)])));
        // Same round as 2, heavier, built on top of 2.
        t.chain.import_block(block(3, 45, 11, refs(&[hl(2, 50)])));

        assert_eq!(t.top(), Some(hl(3, 45)));
        assert!(main_chain(&t, 3, 45));
        assert!(!main_chain(&t, 2, 50));
        assert!(main_chain(&t, 1, 40));
    }

    #[test]
    fn legacy_fork_path_marks_during_ancestor_search() {
        let params = ChainParams {
            fork_fix_height: u64::MAX,
            ..ChainParams::devnet()
        };
        let t = TestChain::with_params(params, Vec::new());
        t.chain.import_block(block(1, 40, 10, vec![]));
        t.chain.import_block(block(2, 40, 11, refs(&[hl(1, 40)])));
        t.chain.import_block(block(3, 30, 11, refs(&[hl(1, 40)])));
        t.chain.import_block(block(4, 50, 12, refs(&[hl(3, 30)])));

        assert_eq!(t.top(), Some(hl(4, 50)));
        assert!(main_chain(&t, 4, 50));
        assert!(main_chain(&t, 3, 30));
        assert!(!main_chain(&t, 2, 40));
    }

    #[test]
    fn pre_top_tracks_previous_round() {
        let t = TestChain::new();
        t.chain.import_block(block(1, 40, 10, vec![]));
        let d1 = t.info(&hl(1, 40)).difficulty;
        t.chain.import_block(block(2, 40, 11, refs(&[hl(1, 40)])));
        let status = t.chain.top_status();
        assert_eq!(status.pre_top, Some(hl(1, 40)));
        assert_eq!(status.pre_top_diff, d1);

        // A same-round replacement of the top leaves the fallback alone.
        t.chain.import_block(block(3, 30, 11, refs(&[hl(1, 40)])));
        assert_eq!(t.chain.top_status().pre_top, Some(hl(1, 40)));
    }
}
