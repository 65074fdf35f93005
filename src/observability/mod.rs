//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (state, client_id, address)
//! HTTP layer produces:
//!     → TraceLayer spans per request, tagged with x-request-id
//! Consumers:
//!     → logging.rs (fmt subscriber to stdout)
//! ```

pub mod logging;

pub use logging::init_logging;
