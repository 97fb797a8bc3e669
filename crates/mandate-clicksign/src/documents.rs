//! Typed client for Clicksign document upload.
//!
//! | Method | Path                | Operation |
//! |--------|---------------------|-----------|
//! | POST   | `/api/v1/documents` | Upload a document for signing |
//!
//! The provider stores the document under a virtual `path` and returns an
//! opaque document key used for all further correlation — signature-list
//! binding and webhook events both reference it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClicksignError;

/// Request to upload a document.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitDocumentRequest {
    /// Virtual storage path shown in the provider's console, e.g.
    /// `/mandates/sales-mandate-42.txt`.
    pub path: String,
    /// Document content, base64-encoded.
    pub content_base64: String,
    /// Signing deadline. Also closes the document when it passes.
    pub deadline_at: DateTime<Utc>,
    /// Close the document automatically once every signer has signed.
    pub auto_close: bool,
    /// Locale for provider-rendered signing pages.
    pub locale: String,
}

/// Document as returned by the provider.
///
/// Only the fields this codebase consumes are modeled; the provider may
/// return more — `deny_unknown_fields` is intentionally not used.
#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    /// Opaque document key.
    pub key: String,
    /// Provider-side document status (e.g. `running`, `closed`).
    #[serde(default)]
    pub status: Option<String>,
    /// When the provider finished processing the upload.
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct DocumentEnvelope<'a> {
    document: &'a SubmitDocumentRequest,
}

#[derive(Deserialize)]
struct DocumentResponseEnvelope {
    document: Document,
}

/// Client for the Clicksign documents resource.
#[derive(Debug, Clone)]
pub struct DocumentsClient {
    http: reqwest::Client,
    base_url: url::Url,
    access_token: String,
}

impl DocumentsClient {
    pub(crate) fn new(http: reqwest::Client, base_url: url::Url, access_token: String) -> Self {
        Self {
            http,
            base_url,
            access_token,
        }
    }

    /// Upload a document for signing.
    ///
    /// Calls `POST {base_url}/api/v1/documents`. Not idempotent: every
    /// successful call creates a new provider-side document, so the caller
    /// must persist the returned key before any further provider call.
    pub async fn create(&self, req: &SubmitDocumentRequest) -> Result<Document, ClicksignError> {
        let endpoint = "POST /documents";
        let url = format!("{}api/v1/documents", self.base_url);

        let resp = self
            .http
            .post(&url)
            .query(&[("access_token", self.access_token.as_str())])
            .json(&DocumentEnvelope { document: req })
            .send()
            .await
            .map_err(|e| ClicksignError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClicksignError::Api {
                endpoint: endpoint.into(),
                status,
                body,
            });
        }

        resp.json::<DocumentResponseEnvelope>()
            .await
            .map(|env| env.document)
            .map_err(|e| ClicksignError::Deserialization {
                endpoint: endpoint.into(),
                source: e,
            })
    }
}
