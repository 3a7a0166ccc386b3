//! RPC microservice subsystem.
//!
//! # Data Flow
//! ```text
//! coins.proto (compiled by build.rs)
//!     → proto (generated messages, server and client stubs)
//!     → coins.rs (CoinsService implementation)
//!     → server.rs (tonic transport on its own listener)
//! ```
//!
//! # Design Decisions
//! - Runs independently of the HTTP server; only the shutdown signal is shared
//! - Handlers are stateless

pub mod coins;
pub mod server;

/// Generated protobuf types for the `coins` package.
pub mod proto {
    tonic::include_proto!("coins");
}

pub use coins::{CoinsRpc, GREETING};
pub use server::{RpcServer, SERVICE_NAME};
