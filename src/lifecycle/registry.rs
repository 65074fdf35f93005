//! Ordered handler lists.
//!
//! # Responsibilities
//! - Hold the connect, disconnect, startup and shutdown handler lists
//! - Append in registration order, never deduplicate, never remove
//! - Hand out clones for invocation without holding a lock across `.await`

use std::sync::{PoisonError, RwLock};

use crate::lifecycle::handler::{ClientHandler, LifecycleHandler};

/// The four append-only handler lists of a runtime.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    connect: RwLock<Vec<ClientHandler>>,
    disconnect: RwLock<Vec<ClientHandler>>,
    startup: RwLock<Vec<LifecycleHandler>>,
    shutdown: RwLock<Vec<LifecycleHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_connect(&self, handler: ClientHandler) {
        push(&self.connect, handler);
    }

    pub fn push_disconnect(&self, handler: ClientHandler) {
        push(&self.disconnect, handler);
    }

    pub fn push_startup(&self, handler: LifecycleHandler) {
        push(&self.startup, handler);
    }

    pub fn push_shutdown(&self, handler: LifecycleHandler) {
        push(&self.shutdown, handler);
    }

    pub fn connect_handlers(&self) -> Vec<ClientHandler> {
        snapshot(&self.connect)
    }

    pub fn disconnect_handlers(&self) -> Vec<ClientHandler> {
        snapshot(&self.disconnect)
    }

    pub fn shutdown_handlers(&self) -> Vec<LifecycleHandler> {
        snapshot(&self.shutdown)
    }

    /// Startup handler at `index`, if any.
    ///
    /// The driver walks the list by index so that handlers appended while
    /// the startup phase is running are still invoked in the same cycle.
    pub fn startup_at(&self, index: usize) -> Option<LifecycleHandler> {
        read(&self.startup).get(index).cloned()
    }

    pub fn counts(&self) -> HandlerCounts {
        HandlerCounts {
            connect: read(&self.connect).len(),
            disconnect: read(&self.disconnect).len(),
            startup: read(&self.startup).len(),
            shutdown: read(&self.shutdown).len(),
        }
    }
}

/// Number of registered handlers per list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandlerCounts {
    pub connect: usize,
    pub disconnect: usize,
    pub startup: usize,
    pub shutdown: usize,
}

// A panicking handler never runs while a list lock is held, so a poisoned
// lock still guards a consistent Vec.
fn read<T>(lock: &RwLock<Vec<T>>) -> std::sync::RwLockReadGuard<'_, Vec<T>> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn push<T>(lock: &RwLock<Vec<T>>, item: T) {
    lock.write().unwrap_or_else(PoisonError::into_inner).push(item);
}

fn snapshot<T: Clone>(lock: &RwLock<Vec<T>>) -> Vec<T> {
    read(lock).clone()
}
