//! JSON body parsing stage.
//!
//! # Responsibilities
//! - Parse `application/json` request bodies up to a byte ceiling
//! - Reject oversized bodies before any route handler runs
//! - Leave every other content type untouched
//!
//! # Design Decisions
//! - A declared `Content-Length` over the limit is rejected without reading the body
//! - Strict parsing: only objects and arrays are accepted at the top level
//! - An empty JSON body parses as `{}`
//! - The parsed value travels in request extensions; the raw bytes are restored
//!   so handlers can still read the body themselves

use axum::{
    body::{Body, Bytes},
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde_json::{Map, Value};
use std::convert::Infallible;

use crate::http::error::ApiError;

/// Byte ceiling for JSON bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonLimit(pub usize);

/// The parsed JSON body. `{}` when the request carried no JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonBody(pub Value);

impl JsonBody {
    fn empty() -> Self {
        JsonBody(Value::Object(Map::new()))
    }
}

impl<S> FromRequestParts<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<JsonBody>()
            .cloned()
            .unwrap_or_else(JsonBody::empty))
    }
}

/// Middleware that parses JSON bodies within the configured limit.
pub async fn json_body_middleware(
    State(JsonLimit(limit)): State<JsonLimit>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !is_json(request.headers()) {
        return Ok(next.run(request).await);
    }

    if let Some(declared) = content_length(request.headers()) {
        if declared > limit as u64 {
            tracing::debug!(declared, limit, "JSON body rejected by Content-Length");
            return Err(ApiError::PayloadTooLarge { limit });
        }
    }

    let (mut parts, body) = request.into_parts();
    let bytes = read_limited(body, limit).await?;

    let parsed = if bytes.is_empty() {
        JsonBody::empty()
    } else {
        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::MalformedJson(e.to_string()))?;
        if !(value.is_object() || value.is_array()) {
            return Err(ApiError::MalformedJson(
                "top-level value must be an object or an array".to_string(),
            ));
        }
        JsonBody(value)
    };

    parts.extensions.insert(parsed);
    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

async fn read_limited(body: Body, limit: usize) -> Result<Bytes, ApiError> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            Err(ApiError::PayloadTooLarge { limit })
        }
        Err(e) => Err(ApiError::BodyRead(e.to_string())),
    }
}

/// `application/json`, optionally with parameters such as `charset`.
fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false)
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::StatusCode,
        middleware,
        routing::post,
        Json, Router,
    };
    use serde_json::json;
    use tower::ServiceExt;

    fn app(limit: usize) -> Router {
        Router::new()
            .route(
                "/",
                post(|JsonBody(body): JsonBody| async move { Json(body) }),
            )
            .layer(middleware::from_fn_with_state(
                JsonLimit(limit),
                json_body_middleware,
            ))
    }

    fn json_request(body: impl Into<Body>) -> Request {
        axum::http::Request::post("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn parses_json_within_limit() {
        let response = app(64)
            .oneshot(json_request(r#"{"coin":"btc"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"coin": "btc"}));
    }

    #[tokio::test]
    async fn body_exactly_at_limit_is_accepted() {
        let body = r#"{"a":"bcdefgh"}"#;
        let response = app(body.len()).oneshot(json_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn body_over_limit_is_rejected() {
        let body = r#"{"a":"bcdefgh"}"#;
        let response = app(body.len() - 1)
            .oneshot(json_request(body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn declared_length_over_limit_is_rejected_early() {
        let request = axum::http::Request::post("/")
            .header(header::CONTENT_TYPE, "application/json; charset=utf-8")
            .header(header::CONTENT_LENGTH, "1000")
            .body(Body::from("{}"))
            .unwrap();
        let response = app(10).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn non_json_content_type_is_not_parsed() {
        let request = axum::http::Request::post("/")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("this is not json and is longer than the limit"))
            .unwrap();
        let response = app(4).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({}));
    }

    #[tokio::test]
    async fn strict_mode_rejects_scalars_and_garbage() {
        let response = app(64).oneshot(json_request("42")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app(64).oneshot(json_request("{nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_json_body_is_empty_object() {
        let response = app(64).oneshot(json_request(Body::empty())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({}));
    }
}
