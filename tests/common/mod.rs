//! Shared utilities for integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use coins_api::config::{AppConfig, FeatureFlags};
use coins_api::{App, Database, RouteGroups, RunningApp};

/// A fresh directory under the system temp dir. Not created.
pub fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("coins-api-test-{}", uuid::Uuid::new_v4()))
}

/// Config bound to ephemeral loopback ports with in-memory storage.
pub fn test_config(features: FeatureFlags, log_dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.database.uri = "sqlite::memory:".to_string();
    config.http.host = "127.0.0.1".to_string();
    config.http.port = 0;
    config.rpc.bind_address = "127.0.0.1:0".to_string();
    config.features = features;
    config.access_log.directory = log_dir.to_path_buf();
    config
}

/// Build the application without binding anything.
pub async fn build(config: AppConfig) -> App {
    let db = Database::connect(&config.database).await.unwrap();
    App::new(Arc::new(config), db, RouteGroups::placeholder()).unwrap()
}

/// Build and start both listeners.
pub async fn start(config: AppConfig) -> RunningApp {
    build(config).await.start().await.unwrap()
}

/// Stop both listeners and wait for the supervisor to finish.
pub async fn stop(running: RunningApp) {
    running.shutdown_handle().trigger();
    tokio::time::timeout(std::time::Duration::from_secs(10), running.wait())
        .await
        .expect("supervisor did not stop in time")
        .expect("listener failed");
}

/// Total number of lines across every file in `dir`. Zero if it does not exist.
#[allow(dead_code)]
pub fn count_log_lines(dir: &Path) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    entries
        .filter_map(Result::ok)
        .filter_map(|entry| fs::read_to_string(entry.path()).ok())
        .map(|content| content.lines().count())
        .sum()
}

/// Plain HTTP client that never goes through a proxy.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
