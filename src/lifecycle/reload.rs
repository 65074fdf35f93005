//! File watcher driving auto-reload.

use std::path::PathBuf;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::ReloadConfig;

/// Watches source paths and emits a reload trigger on change.
pub struct ReloadWatcher {
    paths: Vec<PathBuf>,
    poll_interval: Duration,
    trigger_tx: mpsc::UnboundedSender<()>,
}

impl ReloadWatcher {
    /// Create a new ReloadWatcher.
    ///
    /// Returns the watcher and a receiver for reload triggers.
    pub fn new(config: &ReloadConfig) -> (Self, mpsc::UnboundedReceiver<()>) {
        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();

        (
            Self {
                paths: config.watch_paths.clone(),
                poll_interval: Duration::from_millis(config.poll_interval_ms),
                trigger_tx,
            },
            trigger_rx,
        )
    }

    /// Start watching in a background thread.
    ///
    /// The returned watcher must be kept alive for as long as triggers are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.trigger_tx.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove() {
                        tracing::info!(paths = ?event.paths, "Change detected, reloading...");
                        let _ = tx.send(());
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(self.poll_interval),
        )?;

        for path in &self.paths {
            watcher.watch(path, RecursiveMode::Recursive)?;
        }

        tracing::info!(paths = ?self.paths, "Reload watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_change_emits_trigger() {
        let dir = tempfile::tempdir().unwrap();
        let config = ReloadConfig {
            enabled: true,
            watch_paths: vec![dir.path().to_path_buf()],
            poll_interval_ms: 100,
        };

        let (watcher, mut triggers) = ReloadWatcher::new(&config);
        let _watcher = watcher.run().unwrap();

        std::fs::write(dir.path().join("main.py"), "print('changed')").unwrap();

        tokio::time::timeout(Duration::from_secs(5), triggers.recv())
            .await
            .expect("reload trigger expected")
            .expect("channel open");
    }

    #[test]
    fn test_missing_path_fails_to_watch() {
        let dir = tempfile::tempdir().unwrap();
        let config = ReloadConfig {
            enabled: true,
            watch_paths: vec![dir.path().join("does-not-exist")],
            poll_interval_ms: 100,
        };

        let (watcher, _triggers) = ReloadWatcher::new(&config);
        assert!(watcher.run().is_err());
    }
}
