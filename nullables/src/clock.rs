//! Nullable clock: deterministic time for testing.

use std::sync::atomic::{AtomicU64, Ordering};
use xdag_types::{Clock, XdagTime};

/// A deterministic clock for testing.
///
/// Time only advances when you tell it to.
#[derive(Debug, Default)]
pub struct NullClock {
    current: AtomicU64,
}

impl NullClock {
    pub fn new(initial: XdagTime) -> Self {
        Self {
            current: AtomicU64::new(initial.ticks()),
        }
    }

    /// Advance time by a number of ticks.
    pub fn advance(&self, ticks: u64) {
        self.current.fetch_add(ticks, Ordering::SeqCst);
    }

    /// Advance time by whole rounds.
    pub fn advance_rounds(&self, rounds: u64) {
        self.advance(rounds << xdag_types::time::ROUND_BITS);
    }

    /// Set the time to a specific value.
    pub fn set(&self, time: XdagTime) {
        self.current.store(time.ticks(), Ordering::SeqCst);
    }
}

impl Clock for NullClock {
    fn now(&self) -> XdagTime {
        XdagTime::new(self.current.load(Ordering::SeqCst))
    }
}
