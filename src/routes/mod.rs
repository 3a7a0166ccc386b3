//! Route groups mounted under fixed prefixes.
//!
//! Business handlers live outside this crate; callers hand their routers in
//! through `RouteGroups`. The binary mounts `RouteGroups::placeholder`, which
//! only reports storage health and echoes parsed JSON.

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::http::body::JsonBody;
use crate::http::server::AppState;

/// Prefix for the authentication group.
pub const AUTH_PREFIX: &str = "/auth";
/// Prefix for the user group.
pub const USER_PREFIX: &str = "/user";
/// Prefix for the content group.
pub const CONTENT_PREFIX: &str = "/content";

/// The three externally defined handler collections.
pub struct RouteGroups {
    pub auth: Router<AppState>,
    pub user: Router<AppState>,
    pub content: Router<AppState>,
}

impl RouteGroups {
    /// Stand-in groups for running the bootstrapper on its own.
    pub fn placeholder() -> Self {
        Self {
            auth: placeholder_group("auth"),
            user: placeholder_group("user"),
            content: placeholder_group("content"),
        }
    }

    /// Nest each group under its prefix.
    pub fn mount(self) -> Router<AppState> {
        Router::new()
            .nest(AUTH_PREFIX, self.auth)
            .nest(USER_PREFIX, self.user)
            .nest(CONTENT_PREFIX, self.content)
    }
}

fn placeholder_group(group: &'static str) -> Router<AppState> {
    Router::new().route(
        "/",
        get(move |State(state): State<AppState>| async move {
            let storage = match state.db.ping().await {
                Ok(()) => "up",
                Err(e) => {
                    tracing::warn!(group, error = %e, "Storage ping failed");
                    "down"
                }
            };
            Json(json!({ "group": group, "status": "ok", "storage": storage }))
        })
        .post(move |JsonBody(body): JsonBody| async move {
            Json::<Value>(json!({ "group": group, "received": body }))
        }),
    )
}
