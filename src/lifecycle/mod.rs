//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (App facade → registry.rs):
//!     on_startup / on_shutdown / on_connect / on_disconnect → ordered lists
//!
//! Run cycle (driver.rs):
//!     NotStarted → Starting (startup handlers) → Started (serving)
//!     → Stopping (shutdown handlers, cancel tasks) → Stopped
//!
//! Exit (shutdown.rs, signals.rs):
//!     App::shutdown / SIGINT / SIGTERM → should_exit = true → serve loop ends
//! ```
//!
//! # Design Decisions
//! - All shared state lives in one `RuntimeContext`, passed by `Arc`
//! - Handler lists are append-only; order of registration is order of invocation
//! - The facade never drives transitions; only the driver does

pub mod context;
pub mod driver;
pub mod handler;
pub mod registry;
pub mod reload;
pub mod shutdown;
pub mod signals;
pub mod state;

pub use context::RuntimeContext;
pub use driver::LifecycleDriver;
pub use handler::{ClientHandle, ClientHandler, HandlerError, LifecycleHandler};
pub use registry::{HandlerCounts, HandlerRegistry};
pub use reload::ReloadWatcher;
pub use shutdown::ServerHandle;
pub use state::RuntimeState;
