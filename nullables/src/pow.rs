//! Nullable PoW collaborator.

use std::collections::HashMap;
use std::sync::Mutex;

use xdag_types::XdagTime;
use xdag_work::{PowProvider, WorkError};

/// PoW provider with a scripted fork and scripted hashes.
///
/// Records every set/unset notification so tests can assert on them.
#[derive(Debug, Default)]
pub struct NullPow {
    fork_epoch: Mutex<Option<u64>>,
    hashes: Mutex<HashMap<Vec<u8>, [u8; 32]>>,
    events: Mutex<Vec<PowEvent>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowEvent {
    MainSet(u64),
    MainUnset(u64),
}

impl NullPow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate the fork for epochs after `epoch`.
    pub fn set_fork_epoch(&self, epoch: Option<u64>) {
        *self.fork_epoch.lock().unwrap() = epoch;
    }

    /// Script the post-fork hash returned for `data`.
    pub fn set_hash(&self, data: &[u8], hash: [u8; 32]) {
        self.hashes.lock().unwrap().insert(data.to_vec(), hash);
    }

    pub fn events(&self) -> Vec<PowEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl PowProvider for NullPow {
    fn current_epoch(&self, timestamp: XdagTime) -> u64 {
        timestamp.round()
    }

    fn is_fork_active(&self, epoch: u64) -> bool {
        self.fork_epoch.lock().unwrap().is_some_and(|fork| epoch > fork)
    }

    fn hash(&self, data: &[u8], epoch: u64) -> Result<[u8; 32], WorkError> {
        self.hashes
            .lock()
            .unwrap()
            .get(data)
            .copied()
            .ok_or(WorkError::EngineUnavailable(epoch))
    }

    fn on_main_set(&self, height: u64, _timestamp: XdagTime) {
        self.events.lock().unwrap().push(PowEvent::MainSet(height));
    }

    fn on_main_unset(&self, height: u64, _timestamp: XdagTime) {
        self.events.lock().unwrap().push(PowEvent::MainUnset(height));
    }
}
