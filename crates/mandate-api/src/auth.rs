//! # Authentication Middleware
//!
//! Static bearer-token authentication. The engine assumes an
//! already-authenticated caller; this middleware is the deployment-level
//! gate in front of the mandate routes. When no token is configured, all
//! requests pass (development mode). Webhook and health routes are mounted
//! outside this middleware — webhook authenticity is established by its
//! HMAC signature instead.

use axum::extract::Request;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::{ErrorBody, ErrorDetail};

/// A configured bearer token.
///
/// Custom `Debug` redacts the value; comparison is constant-time.
#[derive(Clone)]
pub struct SecretToken {
    value: Zeroizing<String>,
}

impl std::fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretToken")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

impl SecretToken {
    /// Wrap a configured token value.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Zeroizing::new(value.into()),
        }
    }

    /// Constant-time comparison against a provided token.
    ///
    /// When lengths differ, a dummy comparison keeps timing independent of
    /// the length check.
    fn matches(&self, provided: &str) -> bool {
        let expected = self.value.as_bytes();
        let provided = provided.as_bytes();
        if provided.len() != expected.len() {
            let _ = expected.ct_eq(expected);
            return false;
        }
        provided.ct_eq(expected).into()
    }
}

/// Auth configuration injected into request extensions.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// The expected token; `None` disables authentication.
    pub token: Option<SecretToken>,
}

/// Validate the `Authorization: Bearer` header against the configured
/// token. With no token configured, every request passes.
pub async fn auth_middleware(request: Request, next: Next) -> Response {
    let config = request.extensions().get::<AuthConfig>().cloned();

    let Some(AuthConfig {
        token: Some(expected),
    }) = config
    else {
        return next.run(request).await;
    };

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(value) if value.starts_with("Bearer ") => {
            if expected.matches(&value[7..]) {
                next.run(request).await
            } else {
                tracing::warn!("authentication failed: invalid bearer token");
                unauthorized_response("invalid bearer token")
            }
        }
        Some(_) => {
            tracing::warn!("authentication failed: non-Bearer authorization scheme");
            unauthorized_response("authorization header must use Bearer scheme")
        }
        None => {
            tracing::warn!("authentication failed: missing authorization header");
            unauthorized_response("missing authorization header")
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            details: None,
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
