//! Runtime lifecycle state machine.
//!
//! # States
//! - NotStarted: handlers may be registered, nothing is served yet
//! - Starting: startup handlers are running
//! - Started: startup complete, requests are being served
//! - Stopping: shutdown handlers are running, background tasks are cancelled
//! - Stopped: run cycle finished
//!
//! # State Transitions
//! ```text
//! NotStarted → Starting → Started → Stopping → Stopped
//!                  │                    ▲          │
//!                  └────────────────────┘          │
//! Stopped → Starting (auto-reload cycle) ◀─────────┘
//! ```
//!
//! # Design Decisions
//! - Stored in a `watch` channel inside `RuntimeContext` so tasks can await a phase
//! - Only the runtime driver transitions; the facade only reads

use std::fmt;

/// Current phase of the hosting process lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RuntimeState {
    #[default]
    NotStarted,
    Starting,
    Started,
    Stopping,
    Stopped,
}

impl RuntimeState {
    /// Returns true if the driver may move from `self` to `next`.
    pub fn can_transition_to(self, next: RuntimeState) -> bool {
        use RuntimeState::*;
        matches!(
            (self, next),
            (NotStarted, Starting)
                | (Starting, Started)
                | (Starting, Stopping)
                | (Started, Stopping)
                | (Stopping, Stopped)
                | (Stopped, Starting)
        )
    }

    /// Startup handlers are still accepted in every state except `Started`.
    pub fn accepts_startup_handlers(self) -> bool {
        self != RuntimeState::Started
    }

    /// True once the current run cycle has begun tearing down.
    pub fn is_stopping(self) -> bool {
        matches!(self, RuntimeState::Stopping | RuntimeState::Stopped)
    }
}

impl fmt::Display for RuntimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RuntimeState::NotStarted => "not-started",
            RuntimeState::Starting => "starting",
            RuntimeState::Started => "started",
            RuntimeState::Stopping => "stopping",
            RuntimeState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use RuntimeState::*;

    const ALL: [RuntimeState; 5] = [NotStarted, Starting, Started, Stopping, Stopped];

    #[test]
    fn test_forward_cycle_is_legal() {
        assert!(NotStarted.can_transition_to(Starting));
        assert!(Starting.can_transition_to(Started));
        assert!(Started.can_transition_to(Stopping));
        assert!(Stopping.can_transition_to(Stopped));
        // Reload cycle
        assert!(Stopped.can_transition_to(Starting));
        // Startup aborted
        assert!(Starting.can_transition_to(Stopping));
    }

    #[test]
    fn test_skipping_phases_is_illegal() {
        assert!(!NotStarted.can_transition_to(Started));
        assert!(!NotStarted.can_transition_to(Stopped));
        assert!(!Started.can_transition_to(Starting));
        assert!(!Started.can_transition_to(Stopped));
        assert!(!Stopped.can_transition_to(NotStarted));
        for state in ALL {
            assert!(!state.can_transition_to(state), "{state} -> {state}");
        }
    }

    #[test]
    fn test_only_started_rejects_startup_handlers() {
        for state in ALL {
            assert_eq!(state.accepts_startup_handlers(), state != Started);
        }
    }
}
