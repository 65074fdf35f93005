//! Runtime driver: invokes handler lists at the right lifecycle phase.
//!
//! # Responsibilities
//! - Move `RuntimeState` through its phases
//! - Run startup handlers before serving, shutdown handlers after
//! - Cancel background tasks still running at teardown
//! - Dispatch client connect/disconnect events
//!
//! # Design Decisions
//! - Handlers run sequentially in registration order
//! - A failing handler is logged and does not stop the remaining ones
//! - Shutdown handlers are bounded by a grace period (best effort)

use std::sync::Arc;
use std::time::Duration;

use crate::error::LifecycleError;
use crate::lifecycle::context::RuntimeContext;
use crate::lifecycle::handler::ClientHandle;
use crate::lifecycle::state::RuntimeState;

/// Drives one `RuntimeContext` through its run cycles.
#[derive(Debug, Clone)]
pub struct LifecycleDriver {
    ctx: Arc<RuntimeContext>,
    shutdown_grace: Duration,
}

impl LifecycleDriver {
    pub fn new(ctx: Arc<RuntimeContext>, shutdown_grace: Duration) -> Self {
        Self {
            ctx,
            shutdown_grace,
        }
    }

    pub fn context(&self) -> &Arc<RuntimeContext> {
        &self.ctx
    }

    /// Enter `Starting`, run every startup handler, then enter `Started`.
    pub async fn startup(&self) -> Result<(), LifecycleError> {
        self.ctx.transition(RuntimeState::Starting)?;

        let mut index = 0;
        while let Some(handler) = self.ctx.handlers().startup_at(index) {
            if let Err(e) = handler.invoke().await {
                tracing::error!(index, error = %e, "Startup handler failed");
            }
            index += 1;
        }

        self.ctx.transition(RuntimeState::Started)?;
        tracing::info!(startup_handlers = index, "Application started");
        Ok(())
    }

    /// Enter `Stopping`, run shutdown handlers, cancel background tasks,
    /// then enter `Stopped`.
    pub async fn teardown(&self) -> Result<(), LifecycleError> {
        self.ctx.transition(RuntimeState::Stopping)?;

        let handlers = self.ctx.handlers().shutdown_handlers();
        for (index, handler) in handlers.iter().enumerate() {
            match tokio::time::timeout(self.shutdown_grace, handler.invoke()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!(index, error = %e, "Shutdown handler failed"),
                Err(_) => tracing::warn!(
                    index,
                    grace = ?self.shutdown_grace,
                    "Shutdown handler exceeded grace period, skipping"
                ),
            }
        }

        let cancelled = self.ctx.cancel_background_tasks().await;
        if cancelled > 0 {
            tracing::info!(cancelled, "Cancelled background tasks");
        }

        self.ctx.transition(RuntimeState::Stopped)?;
        tracing::info!(shutdown_handlers = handlers.len(), "Application stopped");
        Ok(())
    }

    /// Run every connect handler for `client`.
    pub async fn client_connected(&self, client: &ClientHandle) {
        tracing::debug!(client_id = %client.id, "Client connected");
        for (index, handler) in self.ctx.handlers().connect_handlers().iter().enumerate() {
            if let Err(e) = handler.invoke(client).await {
                tracing::error!(client_id = %client.id, index, error = %e, "Connect handler failed");
            }
        }
    }

    /// Run every disconnect handler for `client`.
    pub async fn client_disconnected(&self, client: &ClientHandle) {
        tracing::debug!(client_id = %client.id, "Client disconnected");
        for (index, handler) in self.ctx.handlers().disconnect_handlers().iter().enumerate() {
            if let Err(e) = handler.invoke(client).await {
                tracing::error!(client_id = %client.id, index, error = %e, "Disconnect handler failed");
            }
        }
    }
}
