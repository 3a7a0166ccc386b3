//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Mount the route groups and the not-found fallback
//! - Wrap them in the ordered middleware chain
//! - Add request IDs and request spans around everything
//! - Serve on a bound listener until shutdown is signalled

use std::sync::Arc;

use axum::{extract::Request, Router, ServiceExt};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer,
    normalize_path::NormalizePath,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::http::access_log::AccessLog;
use crate::http::error::{not_found, panic_response};
use crate::http::pipeline::{Pipeline, PipelineError, StageKind};
use crate::routes::RouteGroups;
use crate::storage::Database;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Database,
}

/// HTTP server for the API.
pub struct HttpServer {
    router: Router,
    stages: Vec<StageKind>,
}

impl HttpServer {
    /// Assemble the pipeline and mount the route groups.
    pub fn new(
        config: Arc<AppConfig>,
        db: Database,
        routes: RouteGroups,
        access_log: Option<AccessLog>,
    ) -> Result<Self, PipelineError> {
        let pipeline = Pipeline::from_config(&config, access_log)?;
        let stages = pipeline.stages();
        tracing::info!(stages = ?stages, "Middleware chain assembled");

        let routed = routes
            .mount()
            .fallback(not_found)
            .layer(CatchPanicLayer::custom(panic_response));

        let router = pipeline
            .apply(routed)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .with_state(AppState { config, db });

        Ok(Self { router, stages })
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Trailing slashes are trimmed before routing, so `/content/` reaches
    /// the same handler as `/content`.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let app = NormalizePath::trim_trailing_slash(self.router);
        axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// A clone of the fully layered router, for in-process requests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Stage kinds of the assembled chain, outermost first.
    pub fn stages(&self) -> &[StageKind] {
        &self.stages
    }
}
