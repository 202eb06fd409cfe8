//! Rule file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

/// A watcher that signals when the rule file changes.
///
/// The parent directory is watched rather than the file itself so that
/// editors that replace the file by rename are still picked up.
pub struct RulesWatcher {
    path: PathBuf,
    poll_interval: Duration,
    change_tx: mpsc::UnboundedSender<()>,
}

impl RulesWatcher {
    /// Create a new RulesWatcher.
    ///
    /// Returns the watcher and a receiver that yields one message per
    /// relevant change.
    pub fn new(path: &Path, poll_interval: Duration) -> (Self, mpsc::UnboundedReceiver<()>) {
        let (change_tx, change_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                poll_interval,
                change_tx,
            },
            change_rx,
        )
    }

    /// Start watching in a background thread.
    ///
    /// The returned handle must be kept alive for as long as
    /// notifications are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.change_tx.clone();
        let target = self.path.clone();
        let file_name = target.file_name().map(|n| n.to_os_string());

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let relevant = event.kind.is_modify()
                        || event.kind.is_create()
                        || event.kind.is_remove();
                    let ours = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if relevant && ours {
                        tracing::info!(path = %target.display(), "Rules file change detected");
                        let _ = tx.send(());
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(self.poll_interval),
        )?;

        let dir = watch_dir(&self.path);
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, dir = ?dir, "Rules watcher started");
        Ok(watcher)
    }
}

fn watch_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
