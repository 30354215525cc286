use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkError {
    #[error("no PoW engine available for epoch {0}")]
    EngineUnavailable(u64),

    #[error("PoW hash failed: {0}")]
    Hash(String),
}
