//! Ordered middleware chain.
//!
//! # Stage Order
//! ```text
//! request → compression
//!         → content-security-policy   (features.content_security)
//!         → referrer-policy           (features.referrers)
//!         → cors
//!         → json body                 (application/json only, size ceiling)
//!         → access log                (features.logs)
//!         → route groups
//! ```
//!
//! # Design Decisions
//! - Stages are kept as data so the order can be inspected and tested
//! - `apply` folds from the innermost stage outwards, since the last
//!   `Router::layer` call wraps everything before it
//! - Disabled stages are simply absent, not no-op layers
//! - An enabled stage that cannot be built is an error, never skipped

use axum::{http::HeaderValue, middleware, Router};
use thiserror::Error;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, set_header::SetResponseHeaderLayer};

use crate::config::AppConfig;
use crate::http::access_log::{access_log_middleware, AccessLog};
use crate::http::body::{json_body_middleware, JsonLimit};
use crate::security::{cors, headers, ContentSecurityPolicy, PolicyError};

/// Error raised while assembling the chain.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error("access logging is enabled but no access log was opened")]
    MissingAccessLog,
}

/// Kind of a stage, in chain order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Compression,
    ContentSecurityPolicy,
    ReferrerPolicy,
    Cors,
    JsonBody,
    AccessLog,
}

enum Stage {
    Compression(CompressionLayer),
    ContentSecurityPolicy(SetResponseHeaderLayer<HeaderValue>),
    ReferrerPolicy(SetResponseHeaderLayer<HeaderValue>),
    Cors(CorsLayer),
    JsonBody(JsonLimit),
    AccessLog(AccessLog),
}

impl Stage {
    fn kind(&self) -> StageKind {
        match self {
            Stage::Compression(_) => StageKind::Compression,
            Stage::ContentSecurityPolicy(_) => StageKind::ContentSecurityPolicy,
            Stage::ReferrerPolicy(_) => StageKind::ReferrerPolicy,
            Stage::Cors(_) => StageKind::Cors,
            Stage::JsonBody(_) => StageKind::JsonBody,
            Stage::AccessLog(_) => StageKind::AccessLog,
        }
    }

    fn wrap<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        match self {
            Stage::Compression(layer) => router.layer(layer),
            Stage::ContentSecurityPolicy(layer) => router.layer(layer),
            Stage::ReferrerPolicy(layer) => router.layer(layer),
            Stage::Cors(layer) => router.layer(layer),
            Stage::JsonBody(limit) => {
                router.layer(middleware::from_fn_with_state(limit, json_body_middleware))
            }
            Stage::AccessLog(log) => {
                router.layer(middleware::from_fn_with_state(log, access_log_middleware))
            }
        }
    }
}

/// The assembled chain, outermost stage first.
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Assemble the chain from the feature flags and policy tables.
    ///
    /// `features.logs` requires an opened access log; the handle is ignored
    /// when the flag is off.
    pub fn from_config(
        config: &AppConfig,
        access_log: Option<AccessLog>,
    ) -> Result<Self, PipelineError> {
        let mut stages = vec![Stage::Compression(CompressionLayer::new())];

        if config.features.content_security {
            let csp = ContentSecurityPolicy::from_config(&config.policies.content_security)?;
            stages.push(Stage::ContentSecurityPolicy(csp.layer()?));
        }
        if config.features.referrers {
            stages.push(Stage::ReferrerPolicy(headers::referrer_policy_layer(
                &config.policies.referrers,
            )?));
        }

        stages.push(Stage::Cors(cors::permissive()));
        stages.push(Stage::JsonBody(JsonLimit(config.body.json_limit_bytes)));

        if config.features.logs {
            let log = access_log.ok_or(PipelineError::MissingAccessLog)?;
            stages.push(Stage::AccessLog(log));
        }

        Ok(Self { stages })
    }

    /// Stage kinds, outermost first.
    pub fn stages(&self) -> Vec<StageKind> {
        self.stages.iter().map(Stage::kind).collect()
    }

    /// Wrap `router` so every request passes through the stages in order.
    pub fn apply<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.stages
            .into_iter()
            .rev()
            .fold(router, |router, stage| stage.wrap(router))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AccessLogConfig, FeatureFlags};
    use axum::{body::Body, http::{header, Request, StatusCode}, routing::get};
    use tower::ServiceExt;

    fn config(features: FeatureFlags) -> AppConfig {
        let mut config = AppConfig::default();
        config.features = features;
        config
    }

    #[test]
    fn minimal_chain() {
        let pipeline = Pipeline::from_config(&config(FeatureFlags::default()), None).unwrap();
        assert_eq!(
            pipeline.stages(),
            vec![StageKind::Compression, StageKind::Cors, StageKind::JsonBody]
        );
    }

    #[test]
    fn full_chain_order() {
        let features = FeatureFlags {
            content_security: true,
            referrers: true,
            logs: true,
        };
        let (log, _guard) = AccessLog::open(&AccessLogConfig {
            directory: std::env::temp_dir().join(format!("coins-api-{}", uuid::Uuid::new_v4())),
            file_name: "access.log".to_string(),
        })
        .unwrap();
        let pipeline = Pipeline::from_config(&config(features), Some(log)).unwrap();
        assert_eq!(
            pipeline.stages(),
            vec![
                StageKind::Compression,
                StageKind::ContentSecurityPolicy,
                StageKind::ReferrerPolicy,
                StageKind::Cors,
                StageKind::JsonBody,
                StageKind::AccessLog,
            ]
        );
    }

    #[test]
    fn logs_enabled_without_handle_is_an_error() {
        let features = FeatureFlags {
            logs: true,
            ..FeatureFlags::default()
        };
        assert!(matches!(
            Pipeline::from_config(&config(features), None),
            Err(PipelineError::MissingAccessLog)
        ));
    }

    #[test]
    fn invalid_policy_is_an_error() {
        let mut config = config(FeatureFlags {
            referrers: true,
            ..FeatureFlags::default()
        });
        config.policies.referrers.clear();
        assert!(matches!(
            Pipeline::from_config(&config, None),
            Err(PipelineError::Policy(PolicyError::EmptyReferrerPolicy))
        ));
    }

    #[tokio::test]
    async fn headers_follow_flags() {
        let features = FeatureFlags {
            content_security: true,
            referrers: false,
            logs: false,
        };
        let router: Router = Pipeline::from_config(&config(features), None)
            .unwrap()
            .apply(Router::new().route("/", get(|| async { "ok" })));

        let response = router
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(header::CONTENT_SECURITY_POLICY));
        assert!(!response.headers().contains_key(header::REFERRER_POLICY));
    }

    #[tokio::test]
    async fn rejected_body_still_carries_outer_headers() {
        let mut config = config(FeatureFlags {
            content_security: true,
            referrers: true,
            logs: false,
        });
        config.body.json_limit_bytes = 8;
        let router: Router = Pipeline::from_config(&config, None)
            .unwrap()
            .apply(Router::new().route("/", axum::routing::post(|| async { "reached" })));

        let response = router
            .oneshot(
                Request::post("/")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::ORIGIN, "https://example.com")
                    .body(Body::from(r#"{"too":"long for eight"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        // The body stage short-circuits, but every stage outside it has run.
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(response.headers().contains_key(header::CONTENT_SECURITY_POLICY));
        assert!(response.headers().contains_key(header::REFERRER_POLICY));
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }
}
