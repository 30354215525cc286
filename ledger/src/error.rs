use thiserror::Error;
use xdag_types::{AmountError, HashLow};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("block {0} not found")]
    MissingBlock(HashLow),

    #[error("corrupted link in block {block}: {reason}")]
    CorruptedLink { block: HashLow, reason: String },

    #[error("amount error: {0}")]
    Amount(#[from] AmountError),

    #[error("storage error: {0}")]
    Storage(#[from] xdag_store::StoreError),
}
