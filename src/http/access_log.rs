//! Access log stage.
//!
//! One line per request in the compact "tiny" layout:
//!
//! ```text
//! GET /content?page=2 200 17 - 0.412 ms
//! ```
//!
//! Lines go to a daily-rotating file through a non-blocking writer. The
//! returned `WorkerGuard` must be held for as long as lines may be written;
//! dropping it flushes whatever is still queued.

use std::fs;
use std::io::{self, Write};
use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing_appender::non_blocking::{NonBlocking, NonBlockingBuilder, WorkerGuard};

use crate::config::AccessLogConfig;

/// Handle to the access log writer. Cheap to clone.
#[derive(Clone)]
pub struct AccessLog {
    writer: NonBlocking,
}

impl AccessLog {
    /// Create the directory and open the daily-rotating appender.
    pub fn open(config: &AccessLogConfig) -> io::Result<(Self, WorkerGuard)> {
        fs::create_dir_all(&config.directory)?;

        let appender = tracing_appender::rolling::daily(&config.directory, &config.file_name);
        let (writer, guard) = NonBlockingBuilder::default()
            .lossy(false)
            .finish(appender);

        tracing::info!(
            directory = %config.directory.display(),
            file_name = %config.file_name,
            "Access log enabled"
        );

        Ok((Self { writer }, guard))
    }

    fn write_line(&self, line: &str) {
        let mut writer = self.writer.clone();
        if let Err(e) = writer.write_all(line.as_bytes()) {
            tracing::warn!(error = %e, "Failed to write access log line");
        }
    }
}

impl std::fmt::Debug for AccessLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessLog").finish_non_exhaustive()
    }
}

/// Middleware that appends one line per completed request.
pub async fn access_log_middleware(
    State(log): State<AccessLog>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let target = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = next.run(request).await;

    let content_length = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    let line = format_line(
        method.as_str(),
        &target,
        response.status().as_u16(),
        content_length,
        start.elapsed().as_secs_f64() * 1000.0,
    );
    log.write_line(&line);

    response
}

fn format_line(method: &str, target: &str, status: u16, length: &str, millis: f64) -> String {
    format!("{} {} {} {} - {:.3} ms\n", method, target, status, length, millis)
}
