//! Orphan store trait.

use crate::StoreError;
use xdag_types::{Address, HashLow, XdagTime};

/// Persisted blocks no other block references yet.
///
/// Block producers draw from it to pick links for new blocks.
pub trait OrphanStore: Send + Sync {
    fn add(&self, hashlow: &HashLow, timestamp: XdagTime) -> Result<(), StoreError>;

    /// Remove an orphan. Returns whether it was present.
    fn delete(&self, hashlow: &HashLow) -> Result<bool, StoreError>;

    /// Up to `count` orphans older than `before`, as reference links.
    fn take(&self, count: usize, before: XdagTime) -> Result<Vec<Address>, StoreError>;

    fn len(&self) -> Result<u64, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}
