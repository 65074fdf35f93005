//! Shutdown coordination for the server.

use tokio::sync::watch;

/// Shared handle on the running server.
///
/// Carries the `should_exit` flag the serve loop waits on. Setting it is
/// one-way: once true, the current run ends and no new cycle starts.
#[derive(Debug, Clone)]
pub struct ServerHandle {
    /// Watch channel sender holding the `should_exit` flag.
    exit_tx: watch::Sender<bool>,
}

impl ServerHandle {
    /// Create a new handle with `should_exit = false`.
    pub fn new() -> Self {
        let (exit_tx, _) = watch::channel(false);
        Self { exit_tx }
    }

    /// Flip `should_exit` to true.
    pub fn request_exit(&self) {
        self.exit_tx.send_replace(true);
    }

    /// Current value of the `should_exit` flag.
    pub fn should_exit(&self) -> bool {
        *self.exit_tx.borrow()
    }

    /// Wait until `should_exit` becomes true.
    pub async fn wait_for_exit(&self) {
        let mut rx = self.exit_tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while waiting.
        let _ = rx.wait_for(|exit| *exit).await;
    }
}

impl Default for ServerHandle {
    fn default() -> Self {
        Self::new()
    }
}
