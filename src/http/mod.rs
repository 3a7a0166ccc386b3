//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (request ID, tracing span)
//!     → pipeline.rs (ordered stages)
//!         → security headers, CORS
//!         → body.rs (JSON parsing, size ceiling)
//!         → access_log.rs (one line per request)
//!     → route groups / error.rs fallback
//!     → Send to client
//! ```

pub mod access_log;
pub mod body;
pub mod error;
pub mod pipeline;
pub mod server;

pub use body::JsonBody;
pub use error::ApiError;
pub use server::{AppState, HttpServer};
