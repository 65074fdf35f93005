//! Application lifecycle facade.
//!
//! # Responsibilities
//! - Register connect, disconnect, startup and shutdown handlers
//! - Request a graceful shutdown of the server
//! - Mount local directories as static files
//! - Compose user routes into the wrapped axum `Router`
//!
//! # Design Decisions
//! - Composition over the framework: `App` wraps a `Router`, it is not one
//! - The facade reads lifecycle state but never drives transitions
//! - Errors are returned immediately; nothing is logged, retried or swallowed here
//! - Route paths are recorded so static mounts, routes and the client
//!   endpoint are checked against each other before the router is built

use std::path::Path;
use std::sync::Arc;

use axum::routing::MethodRouter;
use axum::Router;

use crate::config::ClientConfig;
use crate::error::LifecycleError;
use crate::http::static_files::{
    normalize_mount_path, overlaps_route, MountError, StaticMount, StaticMountTable,
};
use crate::lifecycle::{ClientHandler, LifecycleHandler, RuntimeContext};

/// Facade over a `RuntimeContext` and an axum `Router`.
#[derive(Debug)]
pub struct App {
    ctx: Arc<RuntimeContext>,
    router: Router,
    routes: Vec<String>,
    client_path: String,
    static_files: StaticMountTable,
}

impl App {
    pub fn new(ctx: Arc<RuntimeContext>) -> Self {
        Self {
            ctx,
            router: Router::new(),
            routes: Vec::new(),
            client_path: ClientConfig::default().ws_path,
            static_files: StaticMountTable::new(),
        }
    }

    pub fn context(&self) -> &Arc<RuntimeContext> {
        &self.ctx
    }

    /// Called every time a client connects.
    ///
    /// Accepts a `ClientHandler` (receives the `ClientHandle`) or a plain
    /// `LifecycleHandler` that ignores the client.
    pub fn on_connect(&self, handler: impl Into<ClientHandler>) {
        self.ctx.handlers().push_connect(handler.into());
    }

    /// Called every time a client disconnects.
    pub fn on_disconnect(&self, handler: impl Into<ClientHandler>) {
        self.ctx.handlers().push_disconnect(handler.into());
    }

    /// Called when the application is started or restarted.
    ///
    /// Must be registered before startup completes; a handler added once the
    /// runtime is `Started` would never run.
    pub fn on_startup(&self, handler: LifecycleHandler) -> Result<(), LifecycleError> {
        if !self.ctx.state().accepts_startup_handlers() {
            return Err(LifecycleError::InvalidLifecyclePhase);
        }
        self.ctx.handlers().push_startup(handler);
        Ok(())
    }

    /// Called when the application is shut down or restarted.
    ///
    /// Background tasks still running afterwards are cancelled.
    pub fn on_shutdown(&self, handler: LifecycleHandler) {
        self.ctx.handlers().push_shutdown(handler);
    }

    /// Programmatically shut down the server.
    ///
    /// Only possible when auto-reload is disabled.
    pub async fn shutdown(&self) -> Result<(), LifecycleError> {
        self.shutdown_handle().shutdown().await
    }

    /// Cloneable handle for calling `shutdown` from request handlers.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            ctx: self.ctx.clone(),
        }
    }

    /// Serve the files in `directory` under `path` (e.g. `/static`).
    ///
    /// Everything in the directory becomes readable by anyone who can reach
    /// the server. Only put non-sensitive files there.
    ///
    /// Fails with `RouteConflict` if the path is taken by a route or by the
    /// client endpoint.
    pub fn add_static_files(
        &mut self,
        path: &str,
        directory: impl AsRef<Path>,
    ) -> Result<&StaticMount, MountError> {
        let mount = normalize_mount_path(path)?;
        let mut taken = std::iter::once(&self.client_path).chain(&self.routes);
        if let Some(route) = taken.find(|r| overlaps_route(&mount, r)) {
            return Err(MountError::RouteConflict {
                mount,
                route: route.clone(),
            });
        }
        self.static_files.add(&mount, directory)
    }

    pub fn static_files(&self) -> &StaticMountTable {
        &self.static_files
    }

    /// Add a route to the wrapped router.
    ///
    /// Fails with `RouteConflict` if a static mount already owns `path`,
    /// or `path` is the client endpoint.
    pub fn route(&mut self, path: &str, method_router: MethodRouter) -> Result<&mut Self, MountError> {
        self.static_files.check_route(path)?;
        if path == self.client_path {
            return Err(MountError::RouteConflict {
                mount: self.client_path.clone(),
                route: path.to_string(),
            });
        }
        self.router = std::mem::take(&mut self.router).route(path, method_router);
        self.routes.push(path.to_string());
        Ok(self)
    }

    /// Move the client WebSocket endpoint to `path`.
    ///
    /// The server calls this with `client.ws_path` before composing routers.
    pub fn reserve_client_path(&mut self, path: &str) -> Result<(), MountError> {
        self.static_files.check_route(path)?;
        if let Some(route) = self.routes.iter().find(|r| *r == path) {
            return Err(MountError::RouteConflict {
                mount: path.to_string(),
                route: route.clone(),
            });
        }
        self.client_path = path.to_string();
        Ok(())
    }

    /// Final router: user routes plus static mounts.
    pub fn into_router(self) -> Router {
        self.static_files.apply(self.router)
    }

    /// Split into the context and the composed router.
    pub fn into_parts(self) -> (Arc<RuntimeContext>, Router) {
        let ctx = self.ctx.clone();
        (ctx, self.into_router())
    }
}

/// Shutdown trigger detached from the `App`.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    ctx: Arc<RuntimeContext>,
}

impl ShutdownHandle {
    /// Set the server's `should_exit` flag.
    ///
    /// Fails with `UnsupportedOperation` in auto-reload mode, where the
    /// supervisor would immediately restart the server; the flag is left
    /// untouched in that case.
    pub async fn shutdown(&self) -> Result<(), LifecycleError> {
        if self.ctx.reload() {
            return Err(LifecycleError::UnsupportedOperation("shutdown()"));
        }
        self.ctx.server().request_exit();
        Ok(())
    }
}
