//! The XDAG node: wires the chain, metrics and background tasks together.

use std::sync::Arc;

use tokio::task::JoinHandle;
use xdag_consensus::{Blockchain, ChainCollaborators, ImportResult};
use xdag_crypto::Ed25519Verifier;
use xdag_store::{AddressStore, BlockStore, OrphanStore, TxHistoryStore};
use xdag_types::{Block, ChainParams, PublicKey, SystemClock};
use xdag_work::Sha256dPow;

use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::metrics::NodeMetrics;
use crate::scheduler::spawn_promotion_task;
use crate::shutdown::{ShutdownController, StopReason};
use crate::tracing_spans::block_import_span;

/// Persistent stores a node runs on.
#[derive(Clone)]
pub struct NodeStores {
    pub blocks: Arc<dyn BlockStore>,
    pub addresses: Arc<dyn AddressStore>,
    pub orphans: Arc<dyn OrphanStore>,
    pub history: Arc<dyn TxHistoryStore>,
}

impl NodeStores {
    /// Full collaborator set for `params`: PoW follows the network's RandomX
    /// fork height, inputs are checked against Ed25519 signatures and time
    /// is the wall clock.
    pub fn into_collaborators(self, params: &ChainParams) -> ChainCollaborators {
        ChainCollaborators {
            store: self.blocks,
            addresses: self.addresses,
            orphans: self.orphans,
            history: self.history,
            pow: Arc::new(Sha256dPow::new(params.randomx_fork_height)),
            verifier: Arc::new(Ed25519Verifier),
            clock: Arc::new(SystemClock),
        }
    }
}

/// A running XDAG node.
pub struct XdagNode {
    pub config: NodeConfig,
    pub chain: Arc<Blockchain>,
    /// Present when `enable_metrics` is set.
    pub metrics: Option<Arc<NodeMetrics>>,
    pub shutdown: Arc<ShutdownController>,
    task_handles: Vec<JoinHandle<()>>,
}

impl XdagNode {
    /// Open the chain over `stores` with the node's own PoW, verifier and
    /// clock.
    pub fn open(
        config: NodeConfig,
        stores: NodeStores,
        local_keys: Vec<PublicKey>,
    ) -> Result<Self, NodeError> {
        let collaborators = stores.into_collaborators(&config.chain_params());
        Self::new(config, collaborators, local_keys)
    }

    /// Open the chain over `collaborators`. Background tasks are not
    /// started until [`start`](Self::start).
    pub fn new(
        config: NodeConfig,
        collaborators: ChainCollaborators,
        local_keys: Vec<PublicKey>,
    ) -> Result<Self, NodeError> {
        std::fs::create_dir_all(&config.data_dir)?;

        let params = config.chain_params();
        let chain = Arc::new(Blockchain::new(params, collaborators, local_keys)?);

        let metrics = if config.enable_metrics {
            let metrics = Arc::new(NodeMetrics::new()?);
            let listener = Arc::clone(&metrics);
            chain.subscribe(Box::new(move |event| listener.observe_event(event)));
            metrics.observe_chain(&chain.stats(), &chain.top_status());
            Some(metrics)
        } else {
            None
        };

        tracing::info!(
            network = config.network.as_str(),
            data_dir = %config.data_dir.display(),
            metrics = config.enable_metrics,
            "XDAG node initialized"
        );

        Ok(Self {
            config,
            chain,
            metrics,
            shutdown: Arc::new(ShutdownController::new()),
            task_handles: Vec::new(),
        })
    }

    /// Spawn the background tasks.
    pub async fn start(&mut self) -> Result<(), NodeError> {
        if !self.task_handles.is_empty() {
            return Err(NodeError::AlreadyStarted);
        }
        if self.shutdown.reason().is_some() {
            // Restarting after a stop: fresh channel for the new tasks.
            self.shutdown = Arc::new(ShutdownController::new());
        }

        let promotion_handle = spawn_promotion_task(
            Arc::clone(&self.chain),
            self.metrics.clone(),
            self.config.promotion_period(),
            self.shutdown.subscribe(),
        );
        self.task_handles.push(promotion_handle);

        tracing::info!(
            promotion_period_ms = self.config.promotion_period_ms,
            "XDAG node started"
        );
        Ok(())
    }

    /// Admit a block and count the outcome.
    pub fn import_block(&self, block: Block) -> ImportResult {
        let span = block_import_span(&block.hashlow());
        let _guard = span.enter();

        let result = self.chain.import_block(block);
        if let Some(m) = &self.metrics {
            m.record_import(&result);
            if result.is_imported() {
                m.observe_chain(&self.chain.stats(), &self.chain.top_status());
            }
        }
        tracing::debug!(result = result.as_str(), "block import finished");
        result
    }

    /// Start, then run until SIGINT or SIGTERM.
    pub async fn run_until_signal(&mut self) -> Result<(), NodeError> {
        self.start().await?;
        let reason = self.shutdown.wait_for_signal().await;
        tracing::info!(reason = reason.as_str(), "signal received");
        self.stop().await
    }

    /// Signal every task, wait up to the configured timeout, then abort
    /// whatever is still running.
    pub async fn stop(&mut self) -> Result<(), NodeError> {
        self.shutdown.trigger(StopReason::Requested);
        let reason = self.shutdown.reason().unwrap_or(StopReason::Requested);
        tracing::info!(
            reason = reason.as_str(),
            tasks = self.task_handles.len(),
            "XDAG node stopping"
        );

        let mut handles: Vec<JoinHandle<()>> = self.task_handles.drain(..).collect();
        let timeout = self.config.shutdown_timeout();
        let wait_all = async {
            for handle in handles.iter_mut() {
                if let Err(e) = handle.await {
                    tracing::warn!(error = %e, "background task ended abnormally");
                }
            }
        };

        let timed_out = tokio::time::timeout(timeout, wait_all).await.is_err();
        if timed_out {
            tracing::warn!(?timeout, "shutdown timeout, aborting remaining tasks");
            for handle in &handles {
                handle.abort();
            }
        }

        if let Some(m) = &self.metrics {
            m.observe_chain(&self.chain.stats(), &self.chain.top_status());
        }

        if timed_out {
            return Err(NodeError::ShutdownTimeout);
        }
        tracing::info!(nmain = self.chain.stats().nmain, "XDAG node stopped");
        Ok(())
    }

    /// Whether background tasks are running.
    pub fn is_running(&self) -> bool {
        !self.task_handles.is_empty()
    }
}
