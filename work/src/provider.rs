//! The PoW collaborator contract.

use xdag_crypto::sha256d;
use xdag_types::XdagTime;

use crate::error::WorkError;
use crate::schedule::RandomXSchedule;

/// Everything the consensus core asks of proof-of-work.
pub trait PowProvider: Send + Sync {
    /// Epoch a timestamp belongs to.
    fn current_epoch(&self, timestamp: XdagTime) -> u64;

    fn is_fork_active(&self, epoch: u64) -> bool;

    /// Post-fork PoW hash of the block bytes for `epoch`.
    fn hash(&self, data: &[u8], epoch: u64) -> Result<[u8; 32], WorkError>;

    /// A block became main at `height`.
    fn on_main_set(&self, height: u64, timestamp: XdagTime);

    /// The main block at `height` was demoted.
    fn on_main_unset(&self, height: u64, timestamp: XdagTime);
}

/// PoW provider for nodes without a RandomX VM.
///
/// Follows the real fork schedule, but the post-fork hash is SHA-256d over
/// the epoch and the block bytes. Weights it produces are stable and
/// epoch-dependent.
#[derive(Debug)]
pub struct Sha256dPow {
    schedule: RandomXSchedule,
}

impl Sha256dPow {
    pub fn new(randomx_fork_height: u64) -> Self {
        Self {
            schedule: RandomXSchedule::new(randomx_fork_height),
        }
    }
}

impl PowProvider for Sha256dPow {
    fn current_epoch(&self, timestamp: XdagTime) -> u64 {
        timestamp.round()
    }

    fn is_fork_active(&self, epoch: u64) -> bool {
        self.schedule.is_fork_active(epoch)
    }

    fn hash(&self, data: &[u8], epoch: u64) -> Result<[u8; 32], WorkError> {
        if !self.schedule.is_fork_active(epoch) {
            return Err(WorkError::EngineUnavailable(epoch));
        }
        let mut input = Vec::with_capacity(data.len() + 8);
        input.extend_from_slice(&epoch.to_le_bytes());
        input.extend_from_slice(data);
        Ok(sha256d(&input))
    }

    fn on_main_set(&self, height: u64, timestamp: XdagTime) {
        self.schedule.on_main_set(height, timestamp);
    }

    fn on_main_unset(&self, height: u64, _timestamp: XdagTime) {
        self.schedule.on_main_unset(height);
    }
}
