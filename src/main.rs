//! Coins API (v1)
//!
//! Boots the HTTP API and the coins gRPC microservice from one process.
//!
//! # Architecture Overview
//!
//! ```text
//!   config.toml ──▶ AppConfig ──▶ Database::connect
//!                                      │
//!                                      ▼
//!                      App::new(config, db, routes)
//!                                      │
//!              ┌───────────────────────┴───────────────────────┐
//!              ▼                                               ▼
//!   HTTP :<port>                                      gRPC localhost:5000
//!   compression → CSP → referrer → CORS               coins.CoinsService/SayHello
//!   → JSON body → access log → /auth /user /content
//!              │                                               │
//!              └──────────── RunningApp::wait (supervisor) ────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use coins_api::config::load_config;
use coins_api::lifecycle::signals::shutdown_signal;
use coins_api::observability::init_logging;
use coins_api::{App, Database, RouteGroups};

#[derive(Parser)]
#[command(name = "coins-api")]
#[command(about = "HTTP API and coins gRPC microservice", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Configuration errors are fatal before anything else starts.
    let config = Arc::new(load_config(&cli.config)?);

    init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        config = %cli.config.display(),
        "coins-api starting"
    );

    let db = Database::connect(&config.database).await?;

    let app = App::new(config, db, RouteGroups::placeholder())?;
    let running = app.start().await?;

    let shutdown = running.shutdown_handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    running.wait().await?;
    Ok(())
}
