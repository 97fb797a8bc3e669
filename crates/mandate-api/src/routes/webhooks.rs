//! # Clicksign Webhook Endpoint
//!
//! Receives provider event deliveries on the raw body — signature
//! verification runs over the exact bytes the provider signed, so the body
//! must not pass through JSON extraction first.
//!
//! Mounted outside bearer auth: authenticity is established by the
//! delivery's HMAC signature (or the explicit permissive mode).

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use mandate_engine::ReconcileOutcome;

use crate::error::{AppError, ErrorBody};
use crate::state::AppState;

/// Header carrying the delivery signature.
const SIGNATURE_HEADER: &str = "Content-Hmac";

/// Build the webhooks router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/webhooks/clicksign", post(receive_webhook))
}

/// Acknowledgement returned to the provider.
#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookAck {
    /// What the delivery did: `applied`, `already_applied`,
    /// `progress_recorded`, or `ignored`.
    pub status: &'static str,
    /// The mandate the event was reconciled against.
    pub mandate_id: i64,
}

/// Receive one provider event delivery.
#[utoipa::path(
    post,
    path = "/v1/webhooks/clicksign",
    request_body = String,
    responses(
        (status = 200, description = "Event processed or benign no-op", body = WebhookAck),
        (status = 400, description = "Malformed event payload", body = ErrorBody),
        (status = 401, description = "Signature verification failed", body = ErrorBody),
        (status = 404, description = "No mandate matches the referenced document", body = ErrorBody),
    ),
    tag = "webhooks"
)]
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, AppError> {
    let Some(reconciler) = state.signing() else {
        return Err(AppError::Unavailable(
            "signing is not configured on this instance".to_string(),
        ));
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let outcome = reconciler.handle(&body, signature).await?;
    let (status, mandate_id) = match outcome {
        ReconcileOutcome::Applied { id, .. } => ("applied", id),
        ReconcileOutcome::AlreadyApplied { id } => ("already_applied", id),
        ReconcileOutcome::ProgressRecorded { id } => ("progress_recorded", id),
        ReconcileOutcome::Ignored { id, .. } => ("ignored", id),
    };
    Ok(Json(WebhookAck { status, mandate_id }))
}
