//! Node stop coordination.
//!
//! The first stop request wins: its [`StopReason`] is recorded and
//! broadcast to the promotion task and anything else that subscribed.
//! Later requests are logged and otherwise ignored.

use std::sync::OnceLock;

use tokio::signal;
use tokio::sync::broadcast;

/// Why the node is stopping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// SIGINT / Ctrl-C.
    Interrupt,
    /// SIGTERM.
    Terminate,
    /// [`XdagNode::stop`](crate::XdagNode::stop) or an embedding program.
    Requested,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interrupt => "interrupt",
            Self::Terminate => "terminate",
            Self::Requested => "requested",
        }
    }
}

pub struct ShutdownController {
    tx: broadcast::Sender<StopReason>,
    reason: OnceLock<StopReason>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            reason: OnceLock::new(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StopReason> {
        self.tx.subscribe()
    }

    /// Record `reason` and notify subscribers, unless a stop is already
    /// under way. Returns whether this call started the stop.
    pub fn trigger(&self, reason: StopReason) -> bool {
        if self.reason.set(reason).is_err() {
            tracing::debug!(
                ignored = reason.as_str(),
                "node already stopping, request ignored"
            );
            return false;
        }
        tracing::info!(reason = reason.as_str(), "node stop requested");
        // No receivers just means no task is running.
        let _ = self.tx.send(reason);
        true
    }

    /// Reason of the stop in progress, if any.
    pub fn reason(&self) -> Option<StopReason> {
        self.reason.get().copied()
    }

    /// Block until the process gets SIGINT or SIGTERM, then trigger the
    /// matching stop.
    pub async fn wait_for_signal(&self) -> StopReason {
        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "cannot listen for SIGTERM, only Ctrl-C stops the node");
                    std::future::pending::<()>().await;
                }
            }
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        let reason = tokio::select! {
            _ = signal::ctrl_c() => StopReason::Interrupt,
            _ = terminate => StopReason::Terminate,
        };
        self.trigger(reason);
        reason
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}
