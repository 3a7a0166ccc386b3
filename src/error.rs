//! Process-level errors.
//!
//! Every variant is fatal: startup errors stop the process before any
//! listener serves, serve errors stop it after the sibling listener has
//! been shut down.

use thiserror::Error;

use crate::config::ConfigError;
use crate::http::pipeline::PipelineError;
use crate::storage::StorageError;

/// Failure while building or starting the application.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("middleware chain error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("failed to open access log: {0}")]
    AccessLog(#[source] std::io::Error),

    #[error("failed to bind {listener} listener on {address}: {source}")]
    Bind {
        listener: &'static str,
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of a running listener.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("HTTP server failed: {0}")]
    Http(#[source] std::io::Error),

    #[error("RPC server failed: {0}")]
    Rpc(#[from] tonic::transport::Error),

    #[error("listener task ended abnormally: {0}")]
    Panicked(String),
}
