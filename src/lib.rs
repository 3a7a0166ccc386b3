//! Coins API bootstrapper library.
//!
//! Assembles an HTTP API (security headers, CORS, JSON body parsing, access
//! logging, three route groups) and a gRPC microservice, and runs both under
//! one supervisor.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routes;
pub mod rpc;
pub mod security;
pub mod storage;

pub use config::schema::AppConfig;
pub use error::{ServeError, StartupError};
pub use http::HttpServer;
pub use lifecycle::{App, RunningApp, Shutdown};
pub use routes::RouteGroups;
pub use storage::Database;
