//! Pre-built [`tracing::Span`] constructors for node operations.
//!
//! Consistent span names and fields make imports and promotion ticks easy
//! to filter and correlate in collected traces.

use tracing::{info_span, Span};
use xdag_types::HashLow;

/// Span covering the admission of a single block.
pub fn block_import_span(hash: &HashLow) -> Span {
    info_span!("block_import", hash = %hash)
}

/// Span covering one pass of the promotion scheduler.
pub fn promotion_tick_span(nmain: u64) -> Span {
    info_span!("promotion_tick", nmain)
}
