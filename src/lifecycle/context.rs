//! Shared runtime context.
//!
//! # Responsibilities
//! - Own the lifecycle state, handler lists, server handle and reload flag
//! - Track background tasks so teardown can cancel them
//!
//! # Design Decisions
//! - One explicit context per runtime, shared via `Arc`, no process globals
//! - Several contexts can coexist (one per test, for instance)

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::error::LifecycleError;
use crate::lifecycle::registry::HandlerRegistry;
use crate::lifecycle::shutdown::ServerHandle;
use crate::lifecycle::state::RuntimeState;

/// State shared between the facade and the runtime driver.
#[derive(Debug)]
pub struct RuntimeContext {
    state: watch::Sender<RuntimeState>,
    handlers: HandlerRegistry,
    server: ServerHandle,
    reload: bool,
    tasks: Mutex<JoinSet<()>>,
}

impl RuntimeContext {
    /// Create a context in `NotStarted` with the given auto-reload mode.
    pub fn new(reload: bool) -> Self {
        Self {
            state: watch::Sender::new(RuntimeState::NotStarted),
            handlers: HandlerRegistry::new(),
            server: ServerHandle::new(),
            reload,
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    pub fn state(&self) -> RuntimeState {
        *self.state.borrow()
    }

    /// Move to `next`, rejecting transitions the state machine does not allow.
    ///
    /// Returns the previous state.
    pub(crate) fn transition(&self, next: RuntimeState) -> Result<RuntimeState, LifecycleError> {
        let mut previous = self.state();
        let changed = self.state.send_if_modified(|state| {
            previous = *state;
            if state.can_transition_to(next) {
                *state = next;
                true
            } else {
                false
            }
        });
        if !changed {
            return Err(LifecycleError::InvalidTransition {
                from: previous,
                to: next,
            });
        }
        tracing::debug!(from = %previous, to = %next, "Lifecycle transition");
        Ok(previous)
    }

    /// Wait until the current run cycle starts tearing down.
    pub async fn wait_for_stopping(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close while waiting.
        let _ = rx.wait_for(|state| state.is_stopping()).await;
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    pub fn server(&self) -> &ServerHandle {
        &self.server
    }

    /// Whether auto-reload mode is active.
    pub fn reload(&self) -> bool {
        self.reload
    }

    /// Spawn a background task owned by the runtime.
    ///
    /// Tasks still running when the runtime tears down are cancelled.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        // Reap finished tasks so the set does not grow without bound.
        while tasks.try_join_next().is_some() {}
        tasks.spawn(task);
    }

    /// Number of background tasks not yet reaped.
    pub fn background_task_count(&self) -> usize {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Abort every background task and wait for them to finish.
    pub(crate) async fn cancel_background_tasks(&self) -> usize {
        let mut tasks = {
            let mut guard = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *guard)
        };
        let count = tasks.len();
        tasks.shutdown().await;
        count
    }
}

impl Default for RuntimeContext {
    fn default() -> Self {
        Self::new(false)
    }
}
