//! Consensus parameters.
//!
//! Every value that differs between networks, or that tests need to shrink,
//! lives here rather than as a scattered constant.

use crate::amount::{XAmount, NANO_PER_XDAG};
use crate::network::NetworkId;
use crate::time::{XdagTime, MAIN_TIME_PERIOD};
use serde::{Deserialize, Serialize};

/// Halving period of the block reward, as a power of two (2^21 main blocks).
pub const MAIN_BIG_PERIOD_LOG: u32 = 21;

/// Default cap on the in-memory extra block pool.
pub const MAX_ALLOWED_EXTRA: usize = 0x10000;

/// Rounds a main-chain block needs above it before it can become main.
pub const CONFIRMATIONS_COUNT: u64 = 16;

/// Consensus parameters for one network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainParams {
    pub network: NetworkId,

    /// Blocks older than this are rejected at admission.
    pub start_time: XdagTime,

    /// How far past the local clock a block timestamp may be.
    pub max_future_ticks: u64,

    /// Capacity of the extra (current-round) pool before eviction starts.
    pub max_allowed_extra: usize,

    /// Main blocks that must sit on top of a block's settling main block
    /// before it counts as confirmed.
    pub confirmations_count: u64,

    /// Rounds that must pass after a candidate's timestamp before promotion.
    pub main_confirm_delay_rounds: u64,

    /// Per-block reward before the Apollo fork.
    pub main_start_amount: XAmount,

    /// Per-block reward from the Apollo fork height on.
    pub apollo_fork_amount: XAmount,

    pub apollo_fork_height: u64,

    /// Minimum amount an account input must carry. Fees come from each
    /// block's own `fee` field, not from here.
    pub min_gas: XAmount,

    /// From this main height on, fork-choice unwinds the old path before
    /// marking the new one instead of marking during the ancestor search.
    pub fork_fix_height: u64,

    /// Main height whose promotion switches round-closing blocks to RandomX.
    pub randomx_fork_height: u64,

    /// Run a promotion check inside every import, in addition to the
    /// periodic scheduler.
    pub promote_on_import: bool,
}

const fn xdag(units: i64) -> XAmount {
    XAmount::from_nano(units * NANO_PER_XDAG)
}

impl ChainParams {
    pub fn mainnet() -> Self {
        Self {
            network: NetworkId::Main,
            start_time: XdagTime::new(0x16940000000),
            max_future_ticks: MAIN_TIME_PERIOD / 4,
            max_allowed_extra: MAX_ALLOWED_EXTRA,
            confirmations_count: CONFIRMATIONS_COUNT,
            main_confirm_delay_rounds: 2 * CONFIRMATIONS_COUNT,
            main_start_amount: xdag(1024),
            apollo_fork_amount: xdag(128),
            apollo_fork_height: 1_017_323,
            min_gas: XAmount::from_nano(NANO_PER_XDAG / 10),
            fork_fix_height: 0,
            randomx_fork_height: 1_540_096,
            promote_on_import: false,
        }
    }

    pub fn testnet() -> Self {
        Self {
            network: NetworkId::Test,
            start_time: XdagTime::new(0x16900000000),
            apollo_fork_height: 196_250,
            randomx_fork_height: 196_288,
            ..Self::mainnet()
        }
    }

    /// Local development network: genesis at time zero and early forks.
    pub fn devnet() -> Self {
        Self {
            network: NetworkId::Dev,
            start_time: XdagTime::new(0),
            apollo_fork_height: 1_000,
            randomx_fork_height: 4_096,
            ..Self::mainnet()
        }
    }

    pub fn for_network(network: NetworkId) -> Self {
        match network {
            NetworkId::Main => Self::mainnet(),
            NetworkId::Test => Self::testnet(),
            NetworkId::Dev => Self::devnet(),
        }
    }

    /// Promotion delay in ticks.
    pub fn main_confirm_delay_ticks(&self) -> u64 {
        self.main_confirm_delay_rounds.saturating_mul(MAIN_TIME_PERIOD)
    }
}

impl Default for ChainParams {
    fn default() -> Self {
        Self::mainnet()
    }
}
