//! HTTP server setup and run loop.
//!
//! # Responsibilities
//! - Compose the application router with the client endpoint
//! - Wire up middleware (tracing, timeout, request ID)
//! - Run startup handlers before serving, shutdown handlers after
//! - Restart the run cycle on reload triggers (auto-reload mode only)
//!
//! # Data Flow
//! ```text
//! loop {
//!     driver.startup()            NotStarted/Stopped → Starting → Started
//!     axum::serve(listener, router)
//!     wait: should_exit | reload trigger
//!     graceful shutdown (drain in-flight requests)
//!     driver.teardown()           Started → Stopping → Stopped
//!     exit → return, reload → rebind same address, next cycle
//! }
//! ```

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::app::App;
use crate::config::AppConfig;
use crate::error::LifecycleError;
use crate::http::client::client_router;
use crate::http::static_files::MountError;
use crate::lifecycle::{LifecycleDriver, RuntimeContext};

/// Error ending a server run.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Why a run cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleEnd {
    Exit,
    Reload,
}

/// HTTP server hosting one `App`.
pub struct HttpServer {
    router: Router,
    driver: LifecycleDriver,
}

impl HttpServer {
    /// Create a new HTTP server for `app` with the given configuration.
    ///
    /// Fails if a static mount or route of `app` takes `client.ws_path`.
    pub fn new(config: AppConfig, mut app: App) -> Result<Self, MountError> {
        app.reserve_client_path(&config.client.ws_path)?;
        let (ctx, app_router) = app.into_parts();
        let driver = LifecycleDriver::new(
            ctx,
            Duration::from_secs(config.timeouts.shutdown_grace_secs),
        );
        let router = Self::build_router(&config, app_router, driver.clone());
        Ok(Self { router, driver })
    }

    /// Build the axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, app_router: Router, driver: LifecycleDriver) -> Router {
        client_router(&config.client.ws_path, driver)
            .merge(app_router)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    pub fn context(&self) -> &Arc<RuntimeContext> {
        self.driver.context()
    }

    /// The composed router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `should_exit` is set.
    ///
    /// Reload triggers are honoured only when the context is in auto-reload
    /// mode; each one tears the current cycle down and starts a new one on
    /// the same address.
    pub async fn run(
        self,
        listener: TcpListener,
        mut reloads: mpsc::UnboundedReceiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        let reload_enabled = self.context().reload();
        let mut listener = Some(listener);

        loop {
            let listener = match listener.take() {
                Some(l) => l,
                None => TcpListener::bind(addr).await?,
            };

            self.driver.startup().await?;
            tracing::info!(address = %addr, reload = reload_enabled, "HTTP server starting");

            let end = self.serve_cycle(listener, &mut reloads, reload_enabled).await;

            self.driver.teardown().await?;

            match end? {
                CycleEnd::Exit => break,
                CycleEnd::Reload => {
                    tracing::info!(address = %addr, "Reloading");
                    // Collapse bursts of file events into one restart.
                    while reloads.try_recv().is_ok() {}
                }
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    async fn serve_cycle(
        &self,
        listener: TcpListener,
        reloads: &mut mpsc::UnboundedReceiver<()>,
        reload_enabled: bool,
    ) -> Result<CycleEnd, ServerError> {
        let app = self
            .router
            .clone()
            .into_make_service_with_connect_info::<SocketAddr>();

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let mut serving = tokio::spawn(
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = stop_rx.await;
                })
                .into_future(),
        );

        let server = self.context().server().clone();
        let end = tokio::select! {
            _ = server.wait_for_exit() => CycleEnd::Exit,
            Some(()) = reloads.recv(), if reload_enabled => CycleEnd::Reload,
            res = &mut serving => {
                // The serve loop only returns on its own after an I/O failure.
                res??;
                return Ok(CycleEnd::Exit);
            }
        };

        let _ = stop_tx.send(());
        serving.await??;
        Ok(end)
    }
}
