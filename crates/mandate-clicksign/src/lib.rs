//! # mandate-clicksign — Typed Rust Client for the Clicksign API
//!
//! Provides typed access to the three Clicksign operations the mandate
//! lifecycle needs:
//! - **Documents** — `POST /api/v1/documents` (upload a contract)
//! - **Signers** — `POST /api/v1/signers` (register a signing party)
//! - **Lists** — `POST /api/v1/lists` (bind signers to a document as a
//!   signature request)
//!
//! ## Architecture
//!
//! This crate is the only path to the Clicksign API; no other crate issues
//! HTTP requests to the provider. Each operation is a direct
//! request/response call with **no internal retry loop**: none of the three
//! endpoints is idempotent at the provider, and a silently retried document
//! upload creates a duplicate provider-side document. Retry policy belongs
//! to the caller, which knows which sub-steps already completed.
//!
//! ## API Path Convention
//!
//! All endpoints live under `{base_url}/api/v1/{resource}` and authenticate
//! via the `access_token` query parameter.

pub mod config;
pub mod documents;
pub mod error;
pub mod lists;
pub mod signers;

pub use config::ClicksignConfig;
pub use error::ClicksignError;

use std::time::Duration;

/// Top-level Clicksign client. Holds sub-clients per resource.
#[derive(Debug, Clone)]
pub struct ClicksignClient {
    documents: documents::DocumentsClient,
    signers: signers::SignersClient,
    lists: lists::ListsClient,
}

impl ClicksignClient {
    /// Create a new Clicksign client from configuration.
    pub fn new(config: ClicksignConfig) -> Result<Self, ClicksignError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClicksignError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        let token = config.access_token.as_str().to_string();
        Ok(Self {
            documents: documents::DocumentsClient::new(
                http.clone(),
                config.base_url.clone(),
                token.clone(),
            ),
            signers: signers::SignersClient::new(
                http.clone(),
                config.base_url.clone(),
                token.clone(),
            ),
            lists: lists::ListsClient::new(http, config.base_url, token),
        })
    }

    /// Access the documents client.
    pub fn documents(&self) -> &documents::DocumentsClient {
        &self.documents
    }

    /// Access the signers client.
    pub fn signers(&self) -> &signers::SignersClient {
        &self.signers
    }

    /// Access the signature-lists client.
    pub fn lists(&self) -> &lists::ListsClient {
        &self.lists
    }
}
