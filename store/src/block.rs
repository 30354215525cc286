//! Block repository trait.

use crate::StoreError;
use xdag_types::{Block, BlockInfo, HashLow, XdagStats, XdagTopStatus};

/// The DAG block repository.
///
/// Payloads are written once by [`put_block`](BlockStore::put_block); the
/// mutable [`BlockInfo`] is rewritten on every flag, balance or pointer change.
pub trait BlockStore: Send + Sync {
    /// Store a block together with its current info.
    fn put_block(&self, block: &Block) -> Result<(), StoreError>;

    /// Full block: payload plus latest info.
    fn get_block(&self, hashlow: &HashLow) -> Result<Option<Block>, StoreError>;

    /// Info only, without the payload.
    fn get_block_info(&self, hashlow: &HashLow) -> Result<Option<BlockInfo>, StoreError>;

    fn has_block(&self, hashlow: &HashLow) -> Result<bool, StoreError>;

    /// Forget a block and its info. Used to revert the admission of a block
    /// whose import failed afterwards.
    fn remove_block(&self, hashlow: &HashLow) -> Result<(), StoreError>;

    /// The main block at `height`, if any.
    fn get_block_by_height(&self, height: u64) -> Result<Option<Block>, StoreError>;

    /// Persist updated info. Keeps the height index in step with the
    /// block's `MAIN` flag and height.
    fn save_block_info(&self, info: &BlockInfo) -> Result<(), StoreError>;

    fn save_top_status(&self, status: &XdagTopStatus) -> Result<(), StoreError>;

    fn load_top_status(&self) -> Result<Option<XdagTopStatus>, StoreError>;

    fn save_stats(&self, stats: &XdagStats) -> Result<(), StoreError>;

    fn load_stats(&self) -> Result<Option<XdagStats>, StoreError>;

    /// Whether the store was bootstrapped from a snapshot. Blocks loaded from
    /// a snapshot are never tracked as orphans.
    fn is_snapshot(&self) -> bool {
        false
    }
}
