//! Cross-origin resource sharing.

use axum::http::Method;
use tower_http::cors::{AllowHeaders, Any, CorsLayer};

/// Permissive CORS: any origin, the common methods, and whatever headers the
/// preflight asks for.
pub fn permissive() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(AllowHeaders::mirror_request())
}
