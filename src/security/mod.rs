//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Outgoing response:
//!     → headers.rs (Content-Security-Policy, Referrer-Policy)
//!     → cors.rs (Access-Control-* headers, preflight answers)
//! ```
//!
//! # Design Decisions
//! - Policy tables are validated with the rest of the configuration
//! - Header values are rendered once at startup

pub mod cors;
pub mod headers;

pub use headers::{ContentSecurityPolicy, PolicyError};
