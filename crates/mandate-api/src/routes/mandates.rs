//! # Mandate CRUD & Submission Endpoints
//!
//! Drafts are editable and deletable; once a mandate is awaiting
//! signature, terms and linked records are frozen and edit/delete answer
//! 409. Submission delegates to the lifecycle controller and maps the
//! engine's error classes onto response codes, so a caller can tell a
//! retryable upstream hiccup (502 `UPSTREAM_ERROR`) from a submission that
//! must be resumed (502 `PARTIAL_SUBMISSION`).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use mandate_core::{ContractingParty, Property, Terms};
use mandate_engine::MandateRepository;
use mandate_state::Mandate;

use crate::error::{AppError, ErrorBody};
use crate::state::AppState;

/// Build the mandates router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/mandates", post(create_mandate).get(list_mandates))
        .route(
            "/v1/mandates/:id",
            get(get_mandate).put(update_mandate).delete(delete_mandate),
        )
        .route("/v1/mandates/:id/submit", post(submit_mandate))
}

// ── Request/response types ───────────────────────────────────────────

/// Request to create a draft mandate.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMandateRequest {
    /// Snapshot of the property the mandate is granted against.
    #[schema(value_type = Object)]
    pub property: Property,
    /// The party granting the mandate.
    #[schema(value_type = Object)]
    pub party: ContractingParty,
    /// Id of the broker user creating the mandate.
    pub created_by: i64,
    /// Exclusivity period in days; 0 means non-exclusive.
    pub exclusivity_days: u32,
    /// Brokerage commission percentage.
    #[schema(value_type = String)]
    pub commission_percent: Decimal,
}

/// Request to edit a draft mandate's terms.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMandateRequest {
    /// Exclusivity period in days; 0 means non-exclusive.
    pub exclusivity_days: u32,
    /// Brokerage commission percentage.
    #[schema(value_type = String)]
    pub commission_percent: Decimal,
}

/// Mandate representation returned by every endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct MandateResponse {
    pub id: i64,
    pub status: String,
    #[schema(value_type = Object)]
    pub property: Property,
    #[schema(value_type = Object)]
    pub party: ContractingParty,
    pub created_by: i64,
    pub exclusivity_days: u32,
    #[schema(value_type = String)]
    pub commission_percent: Decimal,
    pub document_key: Option<String>,
    pub request_key: Option<String>,
    pub provider_status: Option<String>,
    pub artifact_url: Option<String>,
    pub artifact_filename: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub signed_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<Mandate> for MandateResponse {
    fn from(m: Mandate) -> Self {
        Self {
            id: m.id,
            status: m.status.to_string(),
            property: m.property,
            party: m.party,
            created_by: m.created_by,
            exclusivity_days: m.terms.exclusivity_days,
            commission_percent: m.terms.commission_percent,
            document_key: m.document_key,
            request_key: m.request_key,
            provider_status: m.provider_status,
            artifact_url: m.artifact_url,
            artifact_filename: m.artifact_filename,
            created_at: m.created_at,
            updated_at: m.updated_at,
            signed_at: m.signed_at,
            expires_at: m.expires_at,
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────

/// Create a draft mandate.
#[utoipa::path(
    post,
    path = "/v1/mandates",
    request_body = CreateMandateRequest,
    responses(
        (status = 201, description = "Draft mandate created", body = MandateResponse),
        (status = 409, description = "Property already has a mandate in flight", body = ErrorBody),
        (status = 422, description = "Party, property, or terms invalid", body = ErrorBody),
    ),
    tag = "mandates"
)]
pub async fn create_mandate(
    State(state): State<AppState>,
    Json(req): Json<CreateMandateRequest>,
) -> Result<(StatusCode, Json<MandateResponse>), AppError> {
    ensure_no_mandate_in_flight(&state, req.property.id, None)?;

    let mandate = Mandate::new(
        state.allocate_id(),
        req.property,
        req.party,
        req.created_by,
        Terms {
            exclusivity_days: req.exclusivity_days,
            commission_percent: req.commission_percent,
        },
        Utc::now(),
    )?;

    state.repository().insert(&mandate).await?;
    tracing::info!(mandate_id = mandate.id, property_id = mandate.property.id, "mandate created");
    Ok((StatusCode::CREATED, Json(mandate.into())))
}

/// List all mandates.
#[utoipa::path(
    get,
    path = "/v1/mandates",
    responses((status = 200, description = "All mandates", body = [MandateResponse])),
    tag = "mandates"
)]
pub async fn list_mandates(State(state): State<AppState>) -> Json<Vec<MandateResponse>> {
    let mut mandates = state.mandates.list();
    mandates.sort_by_key(|m| m.id);
    Json(mandates.into_iter().map(MandateResponse::from).collect())
}

/// Fetch one mandate.
#[utoipa::path(
    get,
    path = "/v1/mandates/{id}",
    params(("id" = i64, Path, description = "Mandate id")),
    responses(
        (status = 200, description = "The mandate", body = MandateResponse),
        (status = 404, description = "No such mandate", body = ErrorBody),
    ),
    tag = "mandates"
)]
pub async fn get_mandate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MandateResponse>, AppError> {
    fetch(&state, id).map(|m| Json(m.into()))
}

/// Edit a draft mandate's terms.
#[utoipa::path(
    put,
    path = "/v1/mandates/{id}",
    params(("id" = i64, Path, description = "Mandate id")),
    request_body = UpdateMandateRequest,
    responses(
        (status = 200, description = "Terms updated", body = MandateResponse),
        (status = 404, description = "No such mandate", body = ErrorBody),
        (status = 409, description = "Mandate is no longer a draft", body = ErrorBody),
        (status = 422, description = "Terms invalid", body = ErrorBody),
    ),
    tag = "mandates"
)]
pub async fn update_mandate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateMandateRequest>,
) -> Result<Json<MandateResponse>, AppError> {
    let terms = Terms {
        exclusivity_days: req.exclusivity_days,
        commission_percent: req.commission_percent,
    };
    terms.validate()?;

    let mut mandate = fetch(&state, id)?;
    let expected = mandate.status;
    mandate.update_terms(terms, Utc::now())?;
    state
        .repository()
        .update(&mandate, expected)
        .await?;
    Ok(Json(mandate.into()))
}

/// Delete a draft mandate.
#[utoipa::path(
    delete,
    path = "/v1/mandates/{id}",
    params(("id" = i64, Path, description = "Mandate id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "No such mandate", body = ErrorBody),
        (status = 409, description = "Mandate is no longer a draft", body = ErrorBody),
    ),
    tag = "mandates"
)]
pub async fn delete_mandate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let mandate = fetch(&state, id)?;
    mandate.ensure_deletable()?;
    state.repository().delete(id).await?;
    tracing::info!(mandate_id = id, "draft mandate deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Send a mandate for signature.
#[utoipa::path(
    post,
    path = "/v1/mandates/{id}/submit",
    params(("id" = i64, Path, description = "Mandate id")),
    responses(
        (status = 200, description = "Mandate awaiting signature", body = MandateResponse),
        (status = 404, description = "No such mandate", body = ErrorBody),
        (status = 409, description = "Status does not allow submission", body = ErrorBody),
        (status = 422, description = "Required contract fields missing", body = ErrorBody),
        (status = 502, description = "Provider failure — retryable or resumable by code", body = ErrorBody),
        (status = 503, description = "Signing is not configured", body = ErrorBody),
    ),
    tag = "mandates"
)]
pub async fn submit_mandate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MandateResponse>, AppError> {
    let Some(controller) = state.controller() else {
        return Err(AppError::Unavailable(
            "signing is not configured on this instance".to_string(),
        ));
    };

    // Application-level half of the one-in-flight rule; the partial unique
    // index is the storage backstop for the race.
    let mandate = fetch(&state, id)?;
    ensure_no_mandate_in_flight(&state, mandate.property.id, Some(id))?;

    let receipt = controller.submit_for_signing(id).await?;
    Ok(Json(receipt.mandate.into()))
}

// ── Helpers ──────────────────────────────────────────────────────────

fn fetch(state: &AppState, id: i64) -> Result<Mandate, AppError> {
    state
        .mandates
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("mandate {id} not found")))
}

/// Reject when the property already has a different mandate in flight.
fn ensure_no_mandate_in_flight(
    state: &AppState,
    property_id: i64,
    exclude: Option<i64>,
) -> Result<(), AppError> {
    let conflicting = state.mandates.find(|m| {
        m.property.id == property_id && m.status.is_in_flight() && Some(m.id) != exclude
    });
    match conflicting {
        Some(existing) => Err(AppError::Conflict(format!(
            "property {property_id} already has mandate {} awaiting signature",
            existing.id
        ))),
        None => Ok(()),
    }
}
