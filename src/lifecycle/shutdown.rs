//! Shutdown coordination.
//!
//! The first trigger wins and records why the process is stopping.
//! Subscribers created after the trigger still observe it, so a task
//! spawned late never waits forever.

use tokio::sync::watch;

/// Why the service is stopping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGTERM, SIGINT or Ctrl-C.
    Signal,
    /// The decision server exited on its own.
    ServerStopped,
    /// A reload hit a fatal rule error or aborted.
    ReloadFailed,
    /// The coordinator was dropped without a trigger.
    Abandoned,
}

/// Coordinator for graceful shutdown.
pub struct Shutdown {
    tx: watch::Sender<Option<ShutdownReason>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Request shutdown. Later triggers keep the first reason.
    pub fn trigger(&self, reason: ShutdownReason) {
        let first = self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        });
        if first {
            tracing::info!(?reason, "Shutdown triggered");
        }
    }

    /// The recorded reason, if shutdown has been triggered.
    pub fn reason(&self) -> Option<ShutdownReason> {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving half handed to long-running tasks.
pub struct ShutdownSignal {
    rx: watch::Receiver<Option<ShutdownReason>>,
}

impl ShutdownSignal {
    /// Resolves once shutdown has been triggered.
    pub async fn recv(&mut self) -> ShutdownReason {
        let reason = match self.rx.wait_for(Option::is_some).await {
            Ok(current) => *current,
            Err(_) => None,
        };
        reason.unwrap_or(ShutdownReason::Abandoned)
    }
}
