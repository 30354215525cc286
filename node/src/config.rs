//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use xdag_types::{ChainParams, NetworkId};

use crate::NodeError;

/// Configuration for an XDAG node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Which network the chain belongs to.
    #[serde(default = "default_network")]
    pub network: NetworkId,

    /// Data directory for chain storage.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Period of the main-chain promotion task, in milliseconds.
    #[serde(default = "default_promotion_period_ms")]
    pub promotion_period_ms: u64,

    /// How long shutdown waits for background tasks before aborting them.
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,

    /// Whether to keep Prometheus metrics.
    #[serde(default)]
    pub enable_metrics: bool,

    /// Overrides applied on top of the network's chain parameters.
    #[serde(default)]
    pub chain: ChainOverrides,
}

/// Optional `[chain]` table. Unset fields keep the network preset.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_allowed_extra: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_confirm_delay_rounds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apollo_fork_height: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fork_fix_height: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub randomx_fork_height: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promote_on_import: Option<bool>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_network() -> NetworkId {
    NetworkId::Dev
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./xdag_data")
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_promotion_period_ms() -> u64 {
    1024
}

fn default_shutdown_timeout_ms() -> u64 {
    5000
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        let config: Self = toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    fn validate(&self) -> Result<(), NodeError> {
        if self.promotion_period_ms == 0 {
            return Err(NodeError::Config(
                "promotion_period_ms must be positive".to_string(),
            ));
        }
        if self.chain.max_allowed_extra == Some(0) {
            return Err(NodeError::Config(
                "chain.max_allowed_extra must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Chain parameters for the configured network with `[chain]` applied.
    pub fn chain_params(&self) -> ChainParams {
        let mut params = ChainParams::for_network(self.network);
        let o = &self.chain;
        if let Some(v) = o.max_allowed_extra {
            params.max_allowed_extra = v;
        }
        if let Some(v) = o.main_confirm_delay_rounds {
            params.main_confirm_delay_rounds = v;
        }
        if let Some(v) = o.apollo_fork_height {
            params.apollo_fork_height = v;
        }
        if let Some(v) = o.fork_fix_height {
            params.fork_fix_height = v;
        }
        if let Some(v) = o.randomx_fork_height {
            params.randomx_fork_height = v;
        }
        if let Some(v) = o.promote_on_import {
            params.promote_on_import = v;
        }
        params
    }

    pub fn promotion_period(&self) -> Duration {
        Duration::from_millis(self.promotion_period_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            data_dir: default_data_dir(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            promotion_period_ms: default_promotion_period_ms(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
            enable_metrics: false,
            chain: ChainOverrides::default(),
        }
    }
}
