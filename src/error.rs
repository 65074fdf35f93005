//! Error types raised by the lifecycle facade and the runtime driver.

use thiserror::Error;

use crate::lifecycle::state::RuntimeState;

/// Errors raised synchronously by lifecycle operations.
///
/// None of these are retryable: the caller has to change program order
/// (register earlier) or runtime mode (disable auto-reload).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// A startup handler was registered after the startup phase completed.
    #[error("unable to register another startup handler: the application has already been started")]
    InvalidLifecyclePhase,

    /// The operation is not available in the current runtime mode.
    #[error("{0} is not supported when auto-reload is enabled")]
    UnsupportedOperation(&'static str),

    /// The runtime driver attempted an illegal state change.
    #[error("invalid lifecycle transition from {from} to {to}")]
    InvalidTransition {
        from: RuntimeState,
        to: RuntimeState,
    },
}
