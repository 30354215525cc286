//! Chain tip and running counters.

use crate::amount::XAmount;
use crate::hash::HashLow;
use crate::Difficulty;
use serde::{Deserialize, Serialize};

/// Rounds of hash-rate history kept in [`XdagStats`].
pub const HASHRATE_SAMPLES: usize = 64;

/// The canonical tip and the best block of an earlier round.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XdagTopStatus {
    pub top: Option<HashLow>,
    pub top_diff: Difficulty,
    /// Fallback tip: the heaviest block seen in a round before the top's round.
    pub pre_top: Option<HashLow>,
    pub pre_top_diff: Difficulty,
}

/// Running counters, persisted after every mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct XdagStats {
    /// Height of the latest main block.
    pub nmain: u64,
    pub nblocks: u64,
    /// Largest block count known on the network, never below `nblocks`.
    pub totalnblocks: u64,
    /// Blocks in the extra pool.
    pub nextra: u64,
    /// Persisted blocks nothing references yet.
    pub nnoref: u64,
    /// Blocks waiting for sync, maintained by the sync layer.
    pub nwaitsync: u64,
    pub difficulty: Difficulty,
    pub maxdifficulty: Difficulty,
    /// Sum of balances held by locally owned blocks.
    pub balance: XAmount,
    /// Highest self-weight per round, all blocks.
    pub hashrate_total: Vec<Difficulty>,
    /// Highest self-weight per round, local blocks only.
    pub hashrate_ours: Vec<Difficulty>,
    /// Round of the newest sample.
    pub hashrate_last_round: u64,
}

impl Default for XdagStats {
    fn default() -> Self {
        Self {
            nmain: 0,
            nblocks: 0,
            totalnblocks: 0,
            nextra: 0,
            nnoref: 0,
            nwaitsync: 0,
            difficulty: Difficulty::zero(),
            maxdifficulty: Difficulty::zero(),
            balance: XAmount::ZERO,
            hashrate_total: vec![Difficulty::zero(); HASHRATE_SAMPLES],
            hashrate_ours: vec![Difficulty::zero(); HASHRATE_SAMPLES],
            hashrate_last_round: 0,
        }
    }
}

impl XdagStats {
    /// Record a block's self-weight in the slot of its round.
    ///
    /// Moving to a newer round clears the slots skipped over. Samples older
    /// than the ring are ignored.
    pub fn record_hashrate(&mut self, round: u64, weight: Difficulty, ours: bool) {
        let ring = HASHRATE_SAMPLES as u64;
        if self.hashrate_total.len() != HASHRATE_SAMPLES {
            self.hashrate_total = vec![Difficulty::zero(); HASHRATE_SAMPLES];
            self.hashrate_ours = vec![Difficulty::zero(); HASHRATE_SAMPLES];
        }
        if round > self.hashrate_last_round {
            let gap = (round - self.hashrate_last_round).min(ring);
            for r in (round - gap + 1)..=round {
                let slot = (r % ring) as usize;
                self.hashrate_total[slot] = Difficulty::zero();
                self.hashrate_ours[slot] = Difficulty::zero();
            }
            self.hashrate_last_round = round;
        } else if self.hashrate_last_round - round >= ring {
            return;
        }
        let slot = (round % ring) as usize;
        if weight > self.hashrate_total[slot] {
            self.hashrate_total[slot] = weight;
        }
        if ours && weight > self.hashrate_ours[slot] {
            self.hashrate_ours[slot] = weight;
        }
    }

    /// Mean of the populated per-round samples, `(total, ours)`.
    pub fn hashrate_estimate(&self) -> (Difficulty, Difficulty) {
        (mean_nonzero(&self.hashrate_total), mean_nonzero(&self.hashrate_ours))
    }
}

fn mean_nonzero(samples: &[Difficulty]) -> Difficulty {
    let mut sum = Difficulty::zero();
    let mut count = 0u64;
    for s in samples.iter().filter(|s| !s.is_zero()) {
        // Weights near U256::MAX cannot be summed; the mean saturates.
        sum = sum.saturating_add(*s);
        count += 1;
    }
    if count == 0 {
        Difficulty::zero()
    } else {
        sum / Difficulty::from(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_max_per_round() {
        let mut stats = XdagStats::default();
        stats.record_hashrate(10, Difficulty::from(5), false);
        stats.record_hashrate(10, Difficulty::from(9), true);
        stats.record_hashrate(10, Difficulty::from(7), false);
        assert_eq!(stats.hashrate_total[10], Difficulty::from(9));
        assert_eq!(stats.hashrate_ours[10], Difficulty::from(9));
    }

    #[test]
    fn new_round_clears_stale_slot() {
        let mut stats = XdagStats::default();
        stats.record_hashrate(3, Difficulty::from(100), false);
        stats.record_hashrate(3 + HASHRATE_SAMPLES as u64, Difficulty::from(1), false);
        assert_eq!(stats.hashrate_total[3], Difficulty::from(1));
    }

    #[test]
    fn ignores_samples_older_than_ring() {
        let mut stats = XdagStats::default();
        stats.record_hashrate(200, Difficulty::from(4), false);
        stats.record_hashrate(100, Difficulty::from(50), false);
        assert_eq!(stats.hashrate_total[(100 % 64) as usize], Difficulty::zero());
    }

    #[test]
    fn estimate_averages_populated_slots() {
        let mut stats = XdagStats::default();
        stats.record_hashrate(1, Difficulty::from(10), false);
        stats.record_hashrate(2, Difficulty::from(30), true);
        let (total, ours) = stats.hashrate_estimate();
        assert_eq!(total, Difficulty::from(20));
        assert_eq!(ours, Difficulty::from(30));
    }
}
