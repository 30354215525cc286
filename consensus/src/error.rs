use thiserror::Error;
use xdag_types::{AmountError, HashLow};

#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("block {0} not found")]
    MissingBlock(HashLow),

    #[error("ledger error: {0}")]
    Ledger(#[from] xdag_ledger::LedgerError),

    #[error("storage error: {0}")]
    Storage(#[from] xdag_store::StoreError),

    #[error("PoW error: {0}")]
    Work(#[from] xdag_work::WorkError),

    #[error("amount error: {0}")]
    Amount(#[from] AmountError),
}
