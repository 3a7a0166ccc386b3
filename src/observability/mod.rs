//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events to stdout)
//!
//! Per request:
//!     → tower-http TraceLayer span, tagged with x-request-id
//!     → http::access_log (one line in the rotating access log)
//! ```

pub mod logging;

pub use logging::init_logging;
