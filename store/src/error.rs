use thiserror::Error;
use xdag_types::HashLow;

/// Failure reported by a storage collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An info write named a block whose payload was never stored.
    #[error("no stored block {0}")]
    MissingBlock(HashLow),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("block encoding error: {0}")]
    Serialization(String),
}
