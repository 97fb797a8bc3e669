//! # mandate-api — Binary Entry Point
//!
//! Starts the Axum HTTP server. Configuration comes from the environment:
//!
//! - `PORT` (default 8080), `AUTH_TOKEN` (unset disables bearer auth)
//! - `DATABASE_URL` (unset runs in-memory only)
//! - `ARTIFACT_DIR` (default `artifacts`)
//! - `CLICKSIGN_*` + `SIGNATORY_*` (unset disables submission/webhooks)
//! - `CLICKSIGN_WEBHOOK_SECRET`, `WEBHOOK_ALLOW_UNSIGNED`

use std::path::PathBuf;

use mandate_api::auth::SecretToken;
use mandate_api::state::{AppConfig, AppState};
use mandate_artifact::FsArtifactStore;
use mandate_engine::{
    LifecycleController, SignatoryConfig, WebhookConfig, WebhookReconciler,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let config = AppConfig {
        port,
        auth_token: std::env::var("AUTH_TOKEN").ok().map(SecretToken::new),
        artifact_dir: std::env::var("ARTIFACT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("artifacts")),
    };

    // Database pool (optional — absent means in-memory only).
    let db_pool = mandate_api::db::init_pool().await.map_err(|e| {
        tracing::error!("database initialization failed: {e}");
        e
    })?;

    let mut state = AppState::new(config.clone());
    if let Some(pool) = db_pool {
        state = state.with_db(pool);
    }

    // Signing: wired only when Clicksign credentials are configured.
    match mandate_clicksign::ClicksignConfig::from_env() {
        Ok(clicksign_config) => {
            let client = mandate_clicksign::ClicksignClient::new(clicksign_config)?;
            let signatory = SignatoryConfig::from_env().map_err(|e| {
                tracing::error!("Clicksign is configured but the brokerage signatory is not: {e}");
                e
            })?;
            let controller = LifecycleController::new(
                state.repository(),
                client,
                FsArtifactStore::new(&config.artifact_dir),
                signatory,
            );
            let reconciler = WebhookReconciler::new(WebhookConfig::from_env(), controller);
            state = state.with_signing(reconciler);
            tracing::info!("Clicksign client configured");
        }
        Err(e) => {
            tracing::warn!(
                "Clicksign not configured: {e}. Submission and webhook endpoints will return 503."
            );
        }
    }

    // Hydrate the in-memory store from the database (if connected).
    state.hydrate_from_db().await.map_err(|e| {
        tracing::error!("database hydration failed: {e}");
        e
    })?;

    let app = mandate_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("mandate API listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
