//! XDAG timestamps.
//!
//! Timestamps count 1/1024ths of a second since the Unix epoch. The high bits
//! (`time >> 16`) select a round of 64 seconds; the last tick of a round
//! (`time & 0xffff == 0xffff`) is reserved for round-closing main candidates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Bits of a timestamp below the round number.
pub const ROUND_BITS: u32 = 16;

/// Ticks in one round (64 seconds).
pub const MAIN_TIME_PERIOD: u64 = 1 << ROUND_BITS;

/// Ticks per second.
pub const TICKS_PER_SECOND: u64 = 1024;

/// A timestamp in 1/1024 s ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct XdagTime(u64);

impl XdagTime {
    pub const fn new(ticks: u64) -> Self {
        Self(ticks)
    }

    pub fn from_unix_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(TICKS_PER_SECOND) / 1000)
    }

    /// The last tick of `round`.
    pub const fn end_of_round(round: u64) -> Self {
        Self((round << ROUND_BITS) | (MAIN_TIME_PERIOD - 1))
    }

    /// The first tick of `round`.
    pub const fn start_of_round(round: u64) -> Self {
        Self(round << ROUND_BITS)
    }

    pub const fn ticks(&self) -> u64 {
        self.0
    }

    /// Round (epoch) number of this timestamp.
    pub const fn round(&self) -> u64 {
        self.0 >> ROUND_BITS
    }

    pub const fn is_end_of_round(&self) -> bool {
        self.0 & (MAIN_TIME_PERIOD - 1) == MAIN_TIME_PERIOD - 1
    }

    pub fn saturating_add_ticks(&self, ticks: u64) -> Self {
        Self(self.0.saturating_add(ticks))
    }

    pub fn to_unix_millis(&self) -> u64 {
        self.0.saturating_mul(1000) / TICKS_PER_SECOND
    }
}

impl fmt::Display for XdagTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Source of the current time, swappable for deterministic tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> XdagTime;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> XdagTime {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        XdagTime::from_unix_millis(u64::try_from(millis).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_boundaries() {
        let end = XdagTime::end_of_round(5);
        assert_eq!(end.round(), 5);
        assert!(end.is_end_of_round());
        let start = XdagTime::start_of_round(6);
        assert_eq!(start.ticks(), end.ticks() + 1);
        assert!(!start.is_end_of_round());
    }

    #[test]
    fn unix_millis_conversion() {
        let t = XdagTime::from_unix_millis(64_000);
        assert_eq!(t.ticks(), MAIN_TIME_PERIOD);
        assert_eq!(t.round(), 1);
        assert_eq!(t.to_unix_millis(), 64_000);
    }
}
