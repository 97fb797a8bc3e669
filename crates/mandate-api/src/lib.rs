//! # mandate-api — Axum API Services for the Mandate Stack
//!
//! HTTP surface over the mandate lifecycle engine.
//!
//! ## API Surface
//!
//! | Route                        | Module                  | Auth |
//! |------------------------------|-------------------------|------|
//! | `/v1/mandates*`              | [`routes::mandates`]    | bearer |
//! | `/v1/webhooks/clicksign`     | [`routes::webhooks`]    | HMAC signature |
//! | `/health/*`                  | here                    | none |
//! | `/openapi.json`              | [`openapi`]             | bearer |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → AuthMiddleware → Handler
//! ```
//!
//! The webhook and health routes are mounted outside the auth middleware:
//! webhook authenticity is established by its HMAC signature, and probes
//! must work without credentials.

pub mod auth;
pub mod db;
pub mod error;
pub mod openapi;
pub mod repo;
pub mod routes;
pub mod state;

use axum::middleware::from_fn;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::state::AppState;

/// Assemble the full application router.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    // Bearer-authenticated API routes.
    let api = Router::new()
        .merge(routes::mandates::router())
        .merge(openapi::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(auth_config))
        .with_state(state.clone());

    // Signature-authenticated webhook + unauthenticated health probes.
    let open = Router::new()
        .merge(routes::webhooks::router())
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Router::new().merge(open).merge(api)
}

/// Liveness probe — 200 whenever the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — 200 when the application can serve.
async fn readiness() -> &'static str {
    "ready"
}
