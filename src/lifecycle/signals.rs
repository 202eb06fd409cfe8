//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT, SIGHUP)
//! - Translate signals to internal events
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGHUP triggers a rule reload, not shutdown
//! - On non-unix targets only Ctrl-C is observed

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::lifecycle::reload::ReloadTrigger;
use crate::lifecycle::shutdown::{Shutdown, ShutdownReason};

/// Spawn a task that forwards OS signals.
///
/// The task ends after the first shutdown signal or once the reload
/// receiver is gone.
pub fn spawn_signal_listener(
    reload_tx: mpsc::UnboundedSender<ReloadTrigger>,
    shutdown: Arc<Shutdown>,
) -> std::io::Result<JoinHandle<()>> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut hangup = signal(SignalKind::hangup())?;
        let mut terminate = signal(SignalKind::terminate())?;
        let mut interrupt = signal(SignalKind::interrupt())?;

        Ok(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = hangup.recv() => {
                        tracing::info!("SIGHUP received");
                        if reload_tx.send(ReloadTrigger::Signal).is_err() {
                            break;
                        }
                    }
                    _ = terminate.recv() => {
                        tracing::info!("SIGTERM received, shutting down");
                        shutdown.trigger(ShutdownReason::Signal);
                        break;
                    }
                    _ = interrupt.recv() => {
                        tracing::info!("SIGINT received, shutting down");
                        shutdown.trigger(ShutdownReason::Signal);
                        break;
                    }
                }
            }
        }))
    }

    #[cfg(not(unix))]
    {
        let _ = reload_tx;
        Ok(tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Ctrl-C received, shutting down");
                shutdown.trigger(ShutdownReason::Signal);
            }
        }))
    }
}
