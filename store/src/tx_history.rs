//! Transaction history sink.

use crate::StoreError;
use serde::{Deserialize, Serialize};
use xdag_types::{BlockHash, LinkKind, LinkTarget, XAmount, XdagTime};

/// One value movement seen on a link of an admitted block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxHistory {
    /// The block or account on the other side of the link.
    pub target: LinkTarget,
    /// Block carrying the link.
    pub block_hash: BlockHash,
    pub direction: LinkKind,
    pub amount: XAmount,
    pub timestamp: XdagTime,
    pub remark: Option<String>,
}

pub trait TxHistoryStore: Send + Sync {
    fn record(&self, entry: &TxHistory) -> Result<(), StoreError>;
}
