//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, middleware, run cycles)
//!     → client.rs (WebSocket clients: connect/disconnect handlers)
//!     → static_files.rs (ServeDir mounts)
//!     → user routes composed through the App facade
//! ```

pub mod client;
pub mod server;
pub mod static_files;

pub use server::{HttpServer, ServerError};
pub use static_files::{MountError, StaticMount, StaticMountTable};
