//! The view of chain state the settlement engine works against.

use crate::LedgerError;
use xdag_types::{AccountId, Block, BlockInfo, HashLow, XAmount};

/// Block and account state as seen by apply/unapply.
///
/// Implementors decide where a block lives (in-memory pool or persisted
/// store); the engine only loads, mutates and saves. Every write must be
/// visible to the next read.
pub trait LedgerView {
    /// Full block, payload and latest info.
    fn block(&self, hashlow: &HashLow) -> Result<Block, LedgerError>;

    fn info(&self, hashlow: &HashLow) -> Result<BlockInfo, LedgerError>;

    fn save_info(&mut self, info: BlockInfo) -> Result<(), LedgerError>;

    fn account_balance(&self, account: &AccountId) -> Result<XAmount, LedgerError>;

    fn set_account_balance(
        &mut self,
        account: &AccountId,
        balance: XAmount,
    ) -> Result<(), LedgerError>;

    /// Pool-wide balance total.
    fn total_balance(&self) -> Result<XAmount, LedgerError>;

    fn set_total_balance(&mut self, total: XAmount) -> Result<(), LedgerError>;

    /// Load, modify and save one block's info.
    fn update_info<F>(&mut self, hashlow: &HashLow, f: F) -> Result<BlockInfo, LedgerError>
    where
        F: FnOnce(&mut BlockInfo) -> Result<(), LedgerError>,
        Self: Sized,
    {
        let mut info = self.info(hashlow)?;
        f(&mut info)?;
        self.save_info(info.clone())?;
        Ok(info)
    }
}
