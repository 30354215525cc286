//! Events emitted by the chain for subscribers.

use parking_lot::RwLock;
use xdag_types::{BlockHash, Difficulty};

use crate::import::ImportResult;

#[derive(Clone, Debug)]
pub enum ChainEvent {
    /// A block was admitted.
    BlockImported { hash: BlockHash, result: ImportResult },
    /// The canonical tip moved.
    NewTop { hash: BlockHash, difficulty: Difficulty },
    /// A block was promoted to main.
    MainSet { hash: BlockHash, height: u64 },
    /// A main block was demoted by a reorganization.
    MainUnset { hash: BlockHash, height: u64 },
    /// An unreferenced block was dropped from a full extra pool.
    ExtraEvicted { hash: BlockHash },
}

type Listener = Box<dyn Fn(&ChainEvent) + Send + Sync>;

/// Synchronous fan-out event bus.
///
/// Listeners run inline on the emitting thread while the chain's writer
/// lock is held; keep handlers fast and never call back into the chain.
pub struct EventBus {
    listeners: RwLock<Vec<Listener>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, listener: Listener) {
        self.listeners.write().push(listener);
    }

    pub fn emit(&self, event: &ChainEvent) {
        for listener in self.listeners.read().iter() {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
