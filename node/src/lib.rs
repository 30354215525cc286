//! XDAG node core.
//!
//! Hosts a [`xdag_consensus::Blockchain`] and the services around it:
//! - TOML configuration with per-network chain parameters
//! - Structured logging and tracing spans
//! - Prometheus metrics fed from chain events and scheduler ticks
//! - The periodic main-chain promotion task
//! - Graceful shutdown with a bounded wait

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod node;
pub mod scheduler;
pub mod shutdown;
pub mod tracing_spans;

pub use config::{ChainOverrides, NodeConfig};
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use metrics::NodeMetrics;
pub use node::{NodeStores, XdagNode};
pub use scheduler::{promotion_tick, spawn_promotion_task, TickOutcome};
pub use shutdown::{ShutdownController, StopReason};
