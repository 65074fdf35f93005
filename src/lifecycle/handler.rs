//! Lifecycle handler types.
//!
//! # Responsibilities
//! - Wrap user callbacks as synchronous or asynchronous handlers
//! - Invoke them uniformly from the runtime driver
//! - Contain panics so one failing handler does not skip the rest
//!
//! # Design Decisions
//! - Tagged variants instead of a dynamic "callable or awaitable" type
//! - Every handler runs on its own task so a panic surfaces as a `JoinError`
//! - Sync handlers run on the blocking pool; a caller's timeout stops waiting
//!   for them even though the closure itself cannot be interrupted
//! - Handlers are `Arc`-backed and cheap to clone out of the registry

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Boxed future returned by asynchronous handlers.
pub type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Failure observed while invoking a handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error("handler panicked: {0}")]
    Panicked(String),

    #[error("handler task was cancelled")]
    Cancelled,
}

/// Handle of a connected client, passed to connect/disconnect handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHandle {
    /// Unique id assigned when the client connects.
    pub id: Uuid,
    /// `User-Agent` sent with the upgrade request, if any.
    pub user_agent: Option<String>,
}

impl ClientHandle {
    pub fn new(user_agent: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_agent,
        }
    }
}

/// A callback run at startup or shutdown.
#[derive(Clone)]
pub enum LifecycleHandler {
    Sync(Arc<dyn Fn() + Send + Sync>),
    Async(Arc<dyn Fn() -> BoxFuture + Send + Sync>),
}

impl LifecycleHandler {
    /// Wrap a plain closure.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        LifecycleHandler::Sync(Arc::new(f))
    }

    /// Wrap a closure returning a future; the driver awaits it.
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        LifecycleHandler::Async(Arc::new(move || Box::pin(f()) as BoxFuture))
    }

    pub fn is_async(&self) -> bool {
        matches!(self, LifecycleHandler::Async(_))
    }

    /// Run the handler to completion.
    pub async fn invoke(&self) -> Result<(), HandlerError> {
        match self {
            LifecycleHandler::Sync(f) => {
                let f = f.clone();
                join(tokio::task::spawn_blocking(move || f())).await
            }
            LifecycleHandler::Async(f) => join(tokio::spawn(f())).await,
        }
    }
}

impl fmt::Debug for LifecycleHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleHandler::Sync(_) => f.write_str("LifecycleHandler::Sync"),
            LifecycleHandler::Async(_) => f.write_str("LifecycleHandler::Async"),
        }
    }
}

/// A callback run when a client connects or disconnects.
///
/// The client argument is optional from the caller's point of view: any
/// `LifecycleHandler` converts into a `ClientHandler` that ignores it.
#[derive(Clone)]
pub enum ClientHandler {
    Sync(Arc<dyn Fn(&ClientHandle) + Send + Sync>),
    Async(Arc<dyn Fn(ClientHandle) -> BoxFuture + Send + Sync>),
}

impl ClientHandler {
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&ClientHandle) + Send + Sync + 'static,
    {
        ClientHandler::Sync(Arc::new(f))
    }

    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(ClientHandle) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        ClientHandler::Async(Arc::new(move |client: ClientHandle| {
            Box::pin(f(client)) as BoxFuture
        }))
    }

    pub fn is_async(&self) -> bool {
        matches!(self, ClientHandler::Async(_))
    }

    /// Run the handler for `client` to completion.
    pub async fn invoke(&self, client: &ClientHandle) -> Result<(), HandlerError> {
        match self {
            ClientHandler::Sync(f) => {
                let (f, client) = (f.clone(), client.clone());
                join(tokio::task::spawn_blocking(move || f(&client))).await
            }
            ClientHandler::Async(f) => join(tokio::spawn(f(client.clone()))).await,
        }
    }
}

impl From<LifecycleHandler> for ClientHandler {
    fn from(handler: LifecycleHandler) -> Self {
        match handler {
            LifecycleHandler::Sync(f) => ClientHandler::Sync(Arc::new(move |_: &ClientHandle| f())),
            LifecycleHandler::Async(f) => ClientHandler::Async(Arc::new(move |_: ClientHandle| f())),
        }
    }
}

impl fmt::Debug for ClientHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientHandler::Sync(_) => f.write_str("ClientHandler::Sync"),
            ClientHandler::Async(_) => f.write_str("ClientHandler::Async"),
        }
    }
}

/// Aborts the handler task if the awaiting future is dropped (timeout).
///
/// Blocking tasks that already started run to completion regardless.
struct AbortOnDrop(tokio::task::AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn join(task: JoinHandle<()>) -> Result<(), HandlerError> {
    let _guard = AbortOnDrop(task.abort_handle());
    match task.await {
        Ok(()) => Ok(()),
        Err(e) if e.is_panic() => Err(panic_message(e.into_panic())),
        Err(_) => Err(HandlerError::Cancelled),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> HandlerError {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };
    HandlerError::Panicked(message)
}
