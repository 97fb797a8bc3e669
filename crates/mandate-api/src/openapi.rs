//! # OpenAPI Specification Assembly
//!
//! Assembles the utoipa-documented routes into a single OpenAPI spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Mandate Stack API",
        version = "0.3.2",
        description = "Sales-mandate lifecycle management with e-signature orchestration through Clicksign.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        crate::routes::mandates::create_mandate,
        crate::routes::mandates::list_mandates,
        crate::routes::mandates::get_mandate,
        crate::routes::mandates::update_mandate,
        crate::routes::mandates::delete_mandate,
        crate::routes::mandates::submit_mandate,
        crate::routes::webhooks::receive_webhook,
    ),
    components(schemas(
        crate::routes::mandates::CreateMandateRequest,
        crate::routes::mandates::UpdateMandateRequest,
        crate::routes::mandates::MandateResponse,
        crate::routes::webhooks::WebhookAck,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "mandates", description = "Mandate lifecycle operations"),
        (name = "webhooks", description = "Signing-provider event ingestion"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(serve_spec))
}

async fn serve_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_builds_and_lists_all_paths() {
        let spec = ApiDoc::openapi();
        let paths: Vec<&String> = spec.paths.paths.keys().collect();
        assert!(paths.iter().any(|p| p.as_str() == "/v1/mandates"));
        assert!(paths.iter().any(|p| p.as_str() == "/v1/mandates/{id}"));
        assert!(paths.iter().any(|p| p.as_str() == "/v1/mandates/{id}/submit"));
        assert!(paths.iter().any(|p| p.as_str() == "/v1/webhooks/clicksign"));
    }
}
