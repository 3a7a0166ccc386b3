//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global tracing subscriber
//! - Honor `RUST_LOG`, falling back to the configured level
//!
//! # Design Decisions
//! - JSON format for production, pretty format for development
//! - The access log is a separate file writer, not a subscriber layer

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logging(config: &ObservabilityConfig) {
    let registry = tracing_subscriber::registry().with(build_env_filter(config));

    if config.json {
        registry
            .with(fmt::layer().json().with_current_span(true))
            .init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }
}

fn build_env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "coins_api={},tower_http=debug,sqlx=warn",
            config.log_level
        ))
    })
}
