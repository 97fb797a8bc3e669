//! End-to-end tests through the HTTP surface: a wiremock Clicksign on the
//! outside, the real router/middleware/engine wiring in between, and a
//! temporary artifact directory underneath.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mandate_api::auth::SecretToken;
use mandate_api::state::{AppConfig, AppState};
use mandate_artifact::FsArtifactStore;
use mandate_clicksign::{ClicksignClient, ClicksignConfig};
use mandate_engine::{
    compute_signature, LifecycleController, SignatoryConfig, WebhookConfig, WebhookReconciler,
};

const WEBHOOK_SECRET: &str = "shared-webhook-secret";

fn signatory() -> SignatoryConfig {
    SignatoryConfig {
        name: "Imobiliária Beta Ltda".to_string(),
        email: "contratos@beta.example.com".to_string(),
        documentation: "11.222.333/0001-44".to_string(),
        phone: None,
    }
}

/// State wired to a mock provider, with auth disabled.
fn signing_state(mock_uri: &str, artifact_dir: &std::path::Path) -> AppState {
    let state = AppState::new(AppConfig {
        port: 0,
        auth_token: None,
        artifact_dir: artifact_dir.to_path_buf(),
    });
    let client = ClicksignClient::new(
        ClicksignConfig::local_mock(mock_uri, "test-token").unwrap(),
    )
    .unwrap();
    let controller = LifecycleController::new(
        state.repository(),
        client,
        FsArtifactStore::new(artifact_dir),
        signatory(),
    );
    let reconciler = WebhookReconciler::new(
        WebhookConfig {
            secret: Some(zeroize::Zeroizing::new(WEBHOOK_SECRET.to_string())),
            allow_unsigned: false,
        },
        controller,
    );
    state.with_signing(reconciler)
}

/// Mount the three provider endpoints with canned keys.
async fn mount_provider(mock_server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v1/documents"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "document": {"key": "D1", "status": "running"}
        })))
        .mount(mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/signers"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "signer": {"key": "S1"}
        })))
        .mount(mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/lists"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "list": {"key": "R1", "status": "running"}
        })))
        .mount(mock_server)
        .await;
}

fn create_body(property_id: i64) -> serde_json::Value {
    serde_json::json!({
        "property": {
            "id": property_id,
            "registry_number": "M-55.123",
            "address": "Rua das Laranjeiras, 100",
            "city": "Rio de Janeiro",
            "state": "RJ"
        },
        "party": {
            "kind": "married_individual",
            "person": {
                "full_name": "Bruno Lima",
                "email": "bruno.lima@example.com",
                "tax_id": "123.456.789-00"
            },
            "spouse": {
                "full_name": "Carla Lima",
                "tax_id": "987.654.321-00"
            }
        },
        "created_by": 7,
        "exclusivity_days": 0,
        "commission_percent": "6"
    })
}

async fn send_json(
    app: &axum::Router,
    method_: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method_).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).unwrap())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn deliver_webhook(
    app: &axum::Router,
    body: &[u8],
    signature: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/v1/webhooks/clicksign")
        .header("content-type", "application/json");
    if let Some(sig) = signature {
        builder = builder.header("Content-Hmac", sig);
    }
    let response = app
        .clone()
        .oneshot(builder.body(Body::from(body.to_vec())).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

// ── Full flow: create → submit → signed webhook → redelivery ─────────

#[tokio::test]
async fn full_signing_flow_through_http() {
    let mock_server = MockServer::start().await;
    mount_provider(&mock_server).await;
    let dir = tempfile::tempdir().unwrap();
    let app = mandate_api::app(signing_state(&mock_server.uri(), dir.path()));

    // Create a draft.
    let (status, created) = send_json(&app, "POST", "/v1/mandates", Some(create_body(42))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "draft");
    assert_eq!(created["id"], 1);
    assert!(created["document_key"].is_null());

    // Submit for signing.
    let (status, submitted) =
        send_json(&app, "POST", "/v1/mandates/1/submit", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(submitted["status"], "awaiting_signature");
    assert_eq!(submitted["document_key"], "D1");
    assert_eq!(submitted["request_key"], "R1");
    assert_eq!(submitted["provider_status"], "pending");
    assert!(submitted["expires_at"].is_string());
    assert!(submitted["artifact_url"].is_string());

    // Signed webhook with a valid signature.
    let event = br#"{"event":{"name":"document.signed","data":{"document":{"key":"D1"}}}}"#;
    let signature = compute_signature(WEBHOOK_SECRET, event);
    let (status, ack) = deliver_webhook(&app, event, Some(&signature)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["status"], "applied");
    assert_eq!(ack["mandate_id"], 1);

    let (_, fetched) = send_json(&app, "GET", "/v1/mandates/1", None).await;
    assert_eq!(fetched["status"], "signed");
    assert!(fetched["signed_at"].is_string());

    // Identical redelivery is a benign no-op.
    let (status, ack) = deliver_webhook(&app, event, Some(&signature)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["status"], "already_applied");
}

// ── Webhook rejection paths ──────────────────────────────────────────

#[tokio::test]
async fn webhook_with_invalid_signature_is_rejected() {
    let mock_server = MockServer::start().await;
    mount_provider(&mock_server).await;
    let dir = tempfile::tempdir().unwrap();
    let app = mandate_api::app(signing_state(&mock_server.uri(), dir.path()));

    send_json(&app, "POST", "/v1/mandates", Some(create_body(42))).await;
    send_json(&app, "POST", "/v1/mandates/1/submit", None).await;

    let event = br#"{"event":{"name":"document.signed","data":{"document":{"key":"D1"}}}}"#;
    let (status, body) = deliver_webhook(&app, event, Some("sha256=00ff")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    // State untouched.
    let (_, fetched) = send_json(&app, "GET", "/v1/mandates/1", None).await;
    assert_eq!(fetched["status"], "awaiting_signature");
}

#[tokio::test]
async fn webhook_malformed_and_unknown_document_map_to_400_and_404() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let app = mandate_api::app(signing_state(&mock_server.uri(), dir.path()));

    let malformed = br#"{"event":{"name":"document.signed","data":{}}}"#;
    let signature = compute_signature(WEBHOOK_SECRET, malformed);
    let (status, _) = deliver_webhook(&app, malformed, Some(&signature)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let stale = br#"{"event":{"name":"document.signed","data":{"document":{"key":"D-stale"}}}}"#;
    let signature = compute_signature(WEBHOOK_SECRET, stale);
    let (status, _) = deliver_webhook(&app, stale, Some(&signature)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Draft guards over HTTP ───────────────────────────────────────────

#[tokio::test]
async fn edit_and_delete_conflict_after_submission() {
    let mock_server = MockServer::start().await;
    mount_provider(&mock_server).await;
    let dir = tempfile::tempdir().unwrap();
    let app = mandate_api::app(signing_state(&mock_server.uri(), dir.path()));

    send_json(&app, "POST", "/v1/mandates", Some(create_body(42))).await;

    // Draft edits work.
    let update = serde_json::json!({"exclusivity_days": 30, "commission_percent": "5"});
    let (status, updated) =
        send_json(&app, "PUT", "/v1/mandates/1", Some(update.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["exclusivity_days"], 30);

    send_json(&app, "POST", "/v1/mandates/1/submit", None).await;

    // After submission: edit and delete both 409, record unchanged.
    let (status, body) = send_json(&app, "PUT", "/v1/mandates/1", Some(update)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (status, _) = send_json(&app, "DELETE", "/v1/mandates/1", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, fetched) = send_json(&app, "GET", "/v1/mandates/1", None).await;
    assert_eq!(fetched["status"], "awaiting_signature");
    assert_eq!(fetched["exclusivity_days"], 30);
}

#[tokio::test]
async fn property_with_mandate_in_flight_rejects_new_mandates() {
    let mock_server = MockServer::start().await;
    mount_provider(&mock_server).await;
    let dir = tempfile::tempdir().unwrap();
    let app = mandate_api::app(signing_state(&mock_server.uri(), dir.path()));

    send_json(&app, "POST", "/v1/mandates", Some(create_body(42))).await;
    send_json(&app, "POST", "/v1/mandates/1/submit", None).await;

    let (status, body) = send_json(&app, "POST", "/v1/mandates", Some(create_body(42))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    // A different property is fine.
    let (status, _) = send_json(&app, "POST", "/v1/mandates", Some(create_body(43))).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn draft_delete_works() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let app = mandate_api::app(signing_state(&mock_server.uri(), dir.path()));

    send_json(&app, "POST", "/v1/mandates", Some(create_body(42))).await;
    let (status, _) = send_json(&app, "DELETE", "/v1/mandates/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send_json(&app, "GET", "/v1/mandates/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Unconfigured signing ─────────────────────────────────────────────

#[tokio::test]
async fn submit_and_webhook_answer_503_without_signing() {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::new(AppConfig {
        port: 0,
        auth_token: None,
        artifact_dir: dir.path().to_path_buf(),
    });
    let app = mandate_api::app(state);

    send_json(&app, "POST", "/v1/mandates", Some(create_body(42))).await;
    let (status, body) = send_json(&app, "POST", "/v1/mandates/1/submit", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "UNAVAILABLE");

    let (status, _) = deliver_webhook(&app, b"{}", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

// ── Auth in front of the mandate routes ──────────────────────────────

#[tokio::test]
async fn bearer_auth_guards_mandate_routes_but_not_health() {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::new(AppConfig {
        port: 0,
        auth_token: Some(SecretToken::new("api-token")),
        artifact_dir: dir.path().to_path_buf(),
    });
    let app = mandate_api::app(state);

    let (status, _) = send_json(&app, "GET", "/v1/mandates", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v1/mandates")
                .header("Authorization", "Bearer api-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health/liveness")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ── Validation surface ───────────────────────────────────────────────

#[tokio::test]
async fn invalid_party_answers_422() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let app = mandate_api::app(signing_state(&mock_server.uri(), dir.path()));

    let mut body = create_body(42);
    body["party"]["spouse"]["tax_id"] = serde_json::json!("");
    let (status, response) = send_json(&app, "POST", "/v1/mandates", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response["error"]["code"], "VALIDATION_ERROR");
}
