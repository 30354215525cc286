//! Prometheus metrics for the XDAG node.
//!
//! Counters, gauges and a histogram covering block admission, main-chain
//! promotion and the scheduler. [`NodeMetrics`] owns a dedicated
//! [`Registry`] that an exporter can encode into the Prometheus text
//! exposition format with [`NodeMetrics::encode`].

use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, Histogram,
    HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use xdag_consensus::{ChainEvent, ImportResult};
use xdag_types::{XdagStats, XdagTopStatus};

use crate::NodeError;

/// Central collection of all node-level Prometheus metrics.
pub struct NodeMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Import outcomes, labelled by result class.
    pub imports: IntCounterVec,
    /// Blocks promoted to main.
    pub main_set: IntCounter,
    /// Main blocks demoted by a reorganization.
    pub main_unset: IntCounter,
    /// Blocks dropped from a full extra pool.
    pub extra_evicted: IntCounter,
    pub scheduler_ticks: IntCounter,
    /// Ticks that ended in an error or a panic.
    pub scheduler_tick_errors: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    pub nmain: IntGauge,
    pub nblocks: IntGauge,
    pub nextra: IntGauge,
    pub nnoref: IntGauge,
    /// Low 64 bits of the top's cumulative difficulty.
    pub top_difficulty: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Time spent in one promotion tick, in milliseconds.
    pub promotion_tick_ms: Histogram,
}

impl NodeMetrics {
    /// Create a fresh set of metrics, all registered under a new
    /// [`Registry`].
    pub fn new() -> Result<Self, NodeError> {
        let registry = Registry::new();

        // Counters
        let imports = register_int_counter_vec_with_registry!(
            Opts::new("xdag_block_imports_total", "Block import outcomes by result"),
            &["result"],
            registry
        )?;

        let main_set = register_int_counter_with_registry!(
            Opts::new("xdag_main_blocks_set_total", "Blocks promoted to main"),
            registry
        )?;

        let main_unset = register_int_counter_with_registry!(
            Opts::new(
                "xdag_main_blocks_unset_total",
                "Main blocks demoted by a reorganization"
            ),
            registry
        )?;

        let extra_evicted = register_int_counter_with_registry!(
            Opts::new(
                "xdag_extra_evicted_total",
                "Blocks dropped from a full extra pool"
            ),
            registry
        )?;

        let scheduler_ticks = register_int_counter_with_registry!(
            Opts::new("xdag_promotion_ticks_total", "Promotion scheduler ticks"),
            registry
        )?;

        let scheduler_tick_errors = register_int_counter_with_registry!(
            Opts::new(
                "xdag_promotion_tick_errors_total",
                "Promotion ticks that failed"
            ),
            registry
        )?;

        // Gauges
        let nmain = register_int_gauge_with_registry!(
            Opts::new("xdag_nmain", "Current main chain height"),
            registry
        )?;

        let nblocks = register_int_gauge_with_registry!(
            Opts::new("xdag_nblocks", "Admitted blocks"),
            registry
        )?;

        let nextra = register_int_gauge_with_registry!(
            Opts::new("xdag_nextra", "Blocks in the extra pool"),
            registry
        )?;

        let nnoref = register_int_gauge_with_registry!(
            Opts::new("xdag_nnoref", "Stored blocks nothing references yet"),
            registry
        )?;

        let top_difficulty = register_int_gauge_with_registry!(
            Opts::new(
                "xdag_top_difficulty",
                "Low 64 bits of the top block's cumulative difficulty"
            ),
            registry
        )?;

        // Histograms: exponential buckets covering 0.1 ms to ~1.6 s.
        let promotion_tick_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "xdag_promotion_tick_ms",
                "Promotion tick duration in milliseconds"
            )
            .buckets(prometheus::exponential_buckets(0.1, 2.0, 15)?),
            registry
        )?;

        Ok(Self {
            registry,
            imports,
            main_set,
            main_unset,
            extra_evicted,
            scheduler_ticks,
            scheduler_tick_errors,
            nmain,
            nblocks,
            nextra,
            nnoref,
            top_difficulty,
            promotion_tick_ms,
        })
    }

    pub fn record_import(&self, result: &ImportResult) {
        self.imports.with_label_values(&[result.as_str()]).inc();
    }

    /// Count promotions, demotions and evictions as the chain reports them.
    pub fn observe_event(&self, event: &ChainEvent) {
        match event {
            ChainEvent::MainSet { .. } => self.main_set.inc(),
            ChainEvent::MainUnset { .. } => self.main_unset.inc(),
            ChainEvent::ExtraEvicted { .. } => self.extra_evicted.inc(),
            ChainEvent::BlockImported { .. } | ChainEvent::NewTop { .. } => {}
        }
    }

    /// Refresh the gauges from a chain snapshot.
    pub fn observe_chain(&self, stats: &XdagStats, top: &XdagTopStatus) {
        self.nmain.set(to_gauge(stats.nmain));
        self.nblocks.set(to_gauge(stats.nblocks));
        self.nextra.set(to_gauge(stats.nextra));
        self.nnoref.set(to_gauge(stats.nnoref));
        self.top_difficulty.set(to_gauge(top.top_diff.low_u64()));
    }

    /// Render every metric in the Prometheus text format.
    pub fn encode(&self) -> Result<String, NodeError> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

fn to_gauge(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use xdag_types::{BlockHash, Difficulty};

    #[test]
    fn imports_are_labelled_by_result() {
        let metrics = NodeMetrics::new().unwrap();
        metrics.record_import(&ImportResult::ImportedCanonical);
        metrics.record_import(&ImportResult::ImportedCanonical);
        metrics.record_import(&ImportResult::AlreadyExists);

        assert_eq!(
            metrics.imports.with_label_values(&["imported_canonical"]).get(),
            2
        );
        assert_eq!(metrics.imports.with_label_values(&["already_exists"]).get(), 1);
    }

    #[test]
    fn main_events_drive_counters() {
        let metrics = NodeMetrics::new().unwrap();
        let hash = BlockHash::default();
        metrics.observe_event(&ChainEvent::MainSet { hash, height: 1 });
        metrics.observe_event(&ChainEvent::MainSet { hash, height: 2 });
        metrics.observe_event(&ChainEvent::MainUnset { hash, height: 2 });
        metrics.observe_event(&ChainEvent::ExtraEvicted { hash });
        assert_eq!(metrics.main_set.get(), 2);
        assert_eq!(metrics.main_unset.get(), 1);
        assert_eq!(metrics.extra_evicted.get(), 1);
    }

    #[test]
    fn gauges_follow_chain_snapshot() {
        let metrics = NodeMetrics::new().unwrap();
        let stats = XdagStats {
            nmain: 3,
            nblocks: 10,
            nextra: 2,
            nnoref: 1,
            ..XdagStats::default()
        };
        let top = XdagTopStatus {
            top_diff: Difficulty::from(u64::MAX) + Difficulty::from(5u64),
            ..XdagTopStatus::default()
        };
        metrics.observe_chain(&stats, &top);
        assert_eq!(metrics.nmain.get(), 3);
        assert_eq!(metrics.nblocks.get(), 10);
        assert_eq!(metrics.nextra.get(), 2);
        assert_eq!(metrics.top_difficulty.get(), 4);
    }

    #[test]
    fn encoded_text_names_every_family() {
        let metrics = NodeMetrics::new().unwrap();
        metrics.record_import(&ImportResult::MalformedType);
        let text = metrics.encode().unwrap();
        assert!(text.contains("xdag_block_imports_total"));
        assert!(text.contains("xdag_nmain"));
        assert!(text.contains("xdag_promotion_tick_ms"));
    }
}
