//! RandomX fork schedule.
//!
//! The fork height is a main-chain height. When the main block at that height
//! is set, the fork epoch is pinned to that block's epoch; round-closing blocks
//! of strictly later epochs are weighed with RandomX. Unsetting the block
//! clears the pin again.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;
use xdag_types::XdagTime;

const UNSET: u64 = u64::MAX;

#[derive(Debug)]
pub struct RandomXSchedule {
    fork_height: u64,
    fork_epoch: AtomicU64,
}

impl RandomXSchedule {
    pub fn new(fork_height: u64) -> Self {
        Self {
            fork_height,
            fork_epoch: AtomicU64::new(UNSET),
        }
    }

    /// Epoch of the fork block, if it is currently main.
    pub fn fork_epoch(&self) -> Option<u64> {
        match self.fork_epoch.load(Ordering::Acquire) {
            UNSET => None,
            epoch => Some(epoch),
        }
    }

    pub fn is_fork_active(&self, epoch: u64) -> bool {
        self.fork_epoch().is_some_and(|fork| epoch > fork)
    }

    pub fn on_main_set(&self, height: u64, timestamp: XdagTime) {
        if height == self.fork_height {
            let epoch = timestamp.round();
            self.fork_epoch.store(epoch, Ordering::Release);
            info!(height, epoch, "RandomX fork epoch pinned");
        }
    }

    pub fn on_main_unset(&self, height: u64) {
        if height == self.fork_height {
            self.fork_epoch.store(UNSET, Ordering::Release);
            info!(height, "RandomX fork epoch cleared");
        }
    }
}
