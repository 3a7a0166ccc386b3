//! Startup orchestration.
//!
//! # Responsibilities
//! - Assemble the HTTP pipeline and mount route groups from injected config and storage
//! - Bind the HTTP and RPC listeners
//! - Supervise both listener tasks under one shutdown signal
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Config and storage are built by the caller and passed in, never global
//! - When either listener stops, the other is shut down too

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing_appender::non_blocking::WorkerGuard;

use crate::config::AppConfig;
use crate::error::{ServeError, StartupError};
use crate::http::access_log::AccessLog;
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::routes::RouteGroups;
use crate::rpc::{RpcServer, SERVICE_NAME};
use crate::storage::Database;

/// A fully assembled application that has not bound any socket yet.
pub struct App {
    config: Arc<AppConfig>,
    db: Database,
    http: HttpServer,
    rpc: RpcServer,
    access_log_guard: Option<WorkerGuard>,
}

impl App {
    /// Build the middleware chain and mount the route groups.
    pub fn new(
        config: Arc<AppConfig>,
        db: Database,
        routes: RouteGroups,
    ) -> Result<Self, StartupError> {
        let (access_log, access_log_guard) = if config.features.logs {
            let (log, guard) =
                AccessLog::open(&config.access_log).map_err(StartupError::AccessLog)?;
            (Some(log), Some(guard))
        } else {
            (None, None)
        };

        let http = HttpServer::new(config.clone(), db.clone(), routes, access_log)?;

        Ok(Self {
            config,
            db,
            http,
            rpc: RpcServer::new(),
            access_log_guard,
        })
    }

    /// The assembled HTTP server.
    pub fn http(&self) -> &HttpServer {
        &self.http
    }

    /// Bind both listeners and start serving.
    pub async fn start(self) -> Result<RunningApp, StartupError> {
        let http_listener = bind("HTTP", &self.config.http.bind_address()).await?;
        let http_addr = local_addr("HTTP", &http_listener)?;
        tracing::info!(
            address = %http_addr,
            "API available at http://localhost:{}",
            http_addr.port()
        );

        let rpc_listener = bind("RPC", &self.config.rpc.bind_address).await?;
        let rpc_addr = local_addr("RPC", &rpc_listener)?;
        tracing::info!(
            address = %rpc_addr,
            service = SERVICE_NAME,
            "Microservice listening"
        );

        let shutdown = Shutdown::new();
        let mut tasks = JoinSet::new();

        let http_shutdown = shutdown.subscribe();
        let http = self.http;
        tasks.spawn(async move {
            http.run(http_listener, http_shutdown)
                .await
                .map_err(ServeError::Http)
        });

        let rpc_shutdown = shutdown.subscribe();
        let rpc = self.rpc;
        tasks.spawn(async move {
            rpc.run(rpc_listener, rpc_shutdown)
                .await
                .map_err(ServeError::from)
        });

        Ok(RunningApp {
            http_addr,
            rpc_addr,
            shutdown,
            tasks,
            db: self.db,
            access_log_guard: self.access_log_guard,
        })
    }
}

/// Both listeners serving. Dropping this aborts them; prefer `wait`.
pub struct RunningApp {
    http_addr: SocketAddr,
    rpc_addr: SocketAddr,
    shutdown: Shutdown,
    tasks: JoinSet<Result<(), ServeError>>,
    db: Database,
    access_log_guard: Option<WorkerGuard>,
}

impl RunningApp {
    /// Bound HTTP address.
    pub fn http_addr(&self) -> SocketAddr {
        self.http_addr
    }

    /// Bound RPC address.
    pub fn rpc_addr(&self) -> SocketAddr {
        self.rpc_addr
    }

    /// Handle that stops both listeners when triggered.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Wait for both listeners to stop, then release storage and flush the access log.
    ///
    /// Returns the first listener error, if any.
    pub async fn wait(mut self) -> Result<(), ServeError> {
        let result = supervise(self.tasks, self.shutdown).await;

        self.db.close().await;
        drop(self.access_log_guard.take());
        tracing::info!("Shutdown complete");

        result
    }
}

/// Join every task; the first one to end, for any reason, shuts down the rest.
async fn supervise(
    mut tasks: JoinSet<Result<(), ServeError>>,
    shutdown: Shutdown,
) -> Result<(), ServeError> {
    let mut first_error = None;

    while let Some(joined) = tasks.join_next().await {
        let result = joined.unwrap_or_else(|e| Err(ServeError::Panicked(e.to_string())));
        if let Err(e) = result {
            tracing::error!(error = %e, "Listener failed");
            first_error.get_or_insert(e);
        }
        shutdown.trigger();
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

async fn bind(listener: &'static str, address: &str) -> Result<TcpListener, StartupError> {
    TcpListener::bind(address)
        .await
        .map_err(|source| StartupError::Bind {
            listener,
            address: address.to_string(),
            source,
        })
}

fn local_addr(listener: &'static str, bound: &TcpListener) -> Result<SocketAddr, StartupError> {
    bound.local_addr().map_err(|source| StartupError::Bind {
        listener,
        address: "<unknown>".to_string(),
        source,
    })
}
