//! Application lifecycle facade over an axum web server.
//!
//! Register connect, disconnect, startup and shutdown handlers, mount static
//! directories and trigger a graceful shutdown, all against an explicit
//! `RuntimeContext` instead of process globals.
//!
//! ```text
//!   App (facade) ──registers──▶ RuntimeContext ◀──drives── LifecycleDriver
//!        │                      (state, handlers,               │
//!        │                       server handle, reload)         │
//!        └──into_router──▶ axum Router ──▶ HttpServer::run ─────┘
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use app::{App, ShutdownHandle};
pub use config::AppConfig;
pub use error::LifecycleError;
pub use http::{HttpServer, MountError};
pub use lifecycle::{ClientHandle, ClientHandler, LifecycleHandler, RuntimeContext, RuntimeState};
