//! Reload coordination.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinError;

use crate::autoresp::{RuleError, RuleStore};
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::observability::metrics;

/// Exit status when a reload aborts without a rule error (sysexits `EX_SOFTWARE`).
pub const EX_SOFTWARE: u8 = 70;

/// Why a reload was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadTrigger {
    Signal,
    FileChanged,
}

/// A reload that could not complete.
#[derive(Debug, Error)]
pub enum ReloadError {
    #[error(transparent)]
    Rules(#[from] RuleError),

    /// The blocking reload task panicked or was cancelled. The store
    /// keeps whatever set was published before the task started.
    #[error("reload task aborted: {0}")]
    Aborted(#[from] JoinError),
}

impl ReloadError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            ReloadError::Rules(e) => e.exit_code(),
            ReloadError::Aborted(_) => EX_SOFTWARE,
        }
    }
}

/// Run a reload job on the blocking pool.
async fn run_blocking<F>(job: F) -> Result<(), ReloadError>
where
    F: FnOnce() -> Result<(), RuleError> + Send + 'static,
{
    match tokio::task::spawn_blocking(job).await {
        Ok(result) => Ok(result?),
        Err(e) => {
            tracing::error!(error = %e, "Reload task aborted");
            metrics::record_reload("aborted");
            Err(ReloadError::Aborted(e))
        }
    }
}

/// Reload `store` on the blocking pool.
pub async fn reload_store(store: &Arc<RuleStore>) -> Result<(), ReloadError> {
    let store = Arc::clone(store);
    run_blocking(move || store.reload()).await
}

/// Apply reload requests until shutdown.
///
/// Returns the first failed reload; the caller decides how to exit.
/// Bursts of triggers (an editor writing in several steps) collapse
/// into a single reload.
pub async fn run_reload_loop(
    store: Arc<RuleStore>,
    mut triggers: mpsc::UnboundedReceiver<ReloadTrigger>,
    mut shutdown: ShutdownSignal,
) -> Result<(), ReloadError> {
    loop {
        tokio::select! {
            _ = shutdown.recv() => return Ok(()),
            trigger = triggers.recv() => {
                let Some(trigger) = trigger else {
                    return Ok(());
                };
                while triggers.try_recv().is_ok() {}

                tracing::debug!(?trigger, "Reload requested");
                reload_store(&store).await?;
                tracing::info!(
                    ?trigger,
                    initialized = store.is_initialized(),
                    rules = store.rule_count(),
                    "Autoresponder rules reloaded"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autoresp::EX_DATAERR;
    use crate::lifecycle::{Shutdown, ShutdownReason};

    #[tokio::test]
    async fn test_trigger_reloads_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules");
        std::fs::write(&path, "^/old$ \"/old.html\"\n").unwrap();

        let store = Arc::new(RuleStore::with_rules_path(&path));
        store.init().unwrap();

        let shutdown = Shutdown::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_reload_loop(store.clone(), rx, shutdown.subscribe()));

        std::fs::write(&path, "^/new$ \"/new.html\"\n").unwrap();
        tx.send(ReloadTrigger::Signal).unwrap();

        for _ in 0..100 {
            if store.lookup("/new").is_some() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(store.lookup("/new").as_deref(), Some("/new.html"));
        assert_eq!(store.lookup("/old"), None);

        shutdown.trigger(ShutdownReason::Signal);
        assert!(task.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_fatal_error_ends_loop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules");
        std::fs::write(&path, "^/ok$ \"/ok.html\"\n").unwrap();

        let store = Arc::new(RuleStore::with_rules_path(&path));
        store.init().unwrap();

        let shutdown = Shutdown::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_reload_loop(store.clone(), rx, shutdown.subscribe()));

        std::fs::write(&path, "^/(broken \"/x\"\n").unwrap();
        tx.send(ReloadTrigger::FileChanged).unwrap();

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, ReloadError::Rules(RuleError::InvalidPattern { .. })));
        assert_eq!(err.exit_code(), EX_DATAERR);
        assert_eq!(store.lookup("/ok").as_deref(), Some("/ok.html"));
    }

    #[tokio::test]
    async fn test_panicking_reload_is_an_error() {
        let err = run_blocking(|| panic!("reload blew up")).await.unwrap_err();
        assert!(matches!(&err, ReloadError::Aborted(e) if e.is_panic()));
        assert_eq!(err.exit_code(), EX_SOFTWARE);
    }

    #[tokio::test]
    async fn test_closed_channel_ends_loop() {
        let store = Arc::new(RuleStore::disabled());
        let shutdown = Shutdown::new();
        let (tx, rx) = mpsc::unbounded_channel::<ReloadTrigger>();
        drop(tx);
        assert!(run_reload_loop(store, rx, shutdown.subscribe()).await.is_ok());
    }
}
