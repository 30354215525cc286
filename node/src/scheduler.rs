//! Periodic main-chain promotion.
//!
//! Promotion is driven by a timer, not by block arrival. Each tick runs one
//! [`Blockchain::check_new_main`] pass on the blocking pool, since it takes
//! the chain's writer lock and talks to synchronous stores. A failed or
//! panicking tick is logged and counted; the next tick runs as usual.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::Instrument;
use xdag_consensus::Blockchain;
use xdag_types::HashLow;

use crate::metrics::NodeMetrics;
use crate::shutdown::StopReason;
use crate::tracing_spans::promotion_tick_span;

/// What one promotion tick did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Promoted(HashLow),
    Idle,
    /// The pass returned an error or panicked.
    Failed,
}

/// Run a single promotion pass and record it.
pub async fn promotion_tick(chain: &Arc<Blockchain>, metrics: Option<&NodeMetrics>) -> TickOutcome {
    let started = Instant::now();
    let span = promotion_tick_span(chain.stats().nmain);

    let worker = Arc::clone(chain);
    let joined = tokio::task::spawn_blocking(move || worker.check_new_main())
        .instrument(span.clone())
        .await;

    let outcome = span.in_scope(|| match joined {
        Ok(Ok(Some(hash))) => {
            tracing::debug!(hash = %hash, "promotion tick set a main block");
            TickOutcome::Promoted(hash)
        }
        Ok(Ok(None)) => TickOutcome::Idle,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "promotion tick failed");
            TickOutcome::Failed
        }
        Err(e) => {
            tracing::error!(error = %e, "promotion tick panicked");
            TickOutcome::Failed
        }
    });

    if let Some(m) = metrics {
        m.scheduler_ticks.inc();
        if outcome == TickOutcome::Failed {
            m.scheduler_tick_errors.inc();
        }
        m.promotion_tick_ms
            .observe(started.elapsed().as_secs_f64() * 1000.0);
        m.observe_chain(&chain.stats(), &chain.top_status());
    }
    outcome
}

/// Spawn the promotion task. It ticks every `period` until `shutdown_rx`
/// fires.
pub fn spawn_promotion_task(
    chain: Arc<Blockchain>,
    metrics: Option<Arc<NodeMetrics>>,
    period: Duration,
    mut shutdown_rx: broadcast::Receiver<StopReason>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                stop = shutdown_rx.recv() => {
                    let reason = stop.map_or("channel closed", |r| r.as_str());
                    tracing::info!(reason, "promotion task exiting");
                    break;
                }
                _ = interval.tick() => {
                    promotion_tick(&chain, metrics.as_deref()).await;
                }
            }
        }
    })
}
