//! # Signature Gateway Seam
//!
//! The controller talks to the signing provider through this trait, keeping
//! the orchestration logic independent of the HTTP client and testable
//! against fakes. [`ClicksignClient`] is the production implementation.
//!
//! None of the three operations is idempotent at the provider, and the
//! trait contract deliberately carries no retry semantics — the controller
//! decides what is safe to replay based on which keys it already persisted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use mandate_clicksign::documents::SubmitDocumentRequest;
use mandate_clicksign::lists::{CreateListRequest, ListSigner, SignAs};
use mandate_clicksign::signers::CreateSignerRequest;
use mandate_clicksign::{ClicksignClient, ClicksignError};

/// A gateway call failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{endpoint} failed{}: {message}", .status.map(|s| format!(" with status {s}")).unwrap_or_default())]
pub struct GatewayFailure {
    /// The logical endpoint that failed (e.g. `POST /documents`).
    pub endpoint: String,
    /// HTTP status, when the provider answered at all.
    pub status: Option<u16>,
    /// Provider message or transport error text.
    pub message: String,
}

impl From<ClicksignError> for GatewayFailure {
    fn from(err: ClicksignError) -> Self {
        match err {
            ClicksignError::Api {
                endpoint,
                status,
                body,
            } => Self {
                endpoint,
                status: Some(status),
                message: body,
            },
            ClicksignError::Http { endpoint, source } => Self {
                endpoint,
                status: None,
                message: source.to_string(),
            },
            ClicksignError::Deserialization { endpoint, source } => Self {
                endpoint,
                status: None,
                message: format!("response decode failed: {source}"),
            },
            ClicksignError::Config(e) => Self {
                endpoint: "configuration".to_string(),
                status: None,
                message: e.to_string(),
            },
        }
    }
}

/// Document payload handed to the provider.
#[derive(Debug, Clone)]
pub struct DocumentSubmission {
    /// Virtual provider-side path for the document.
    pub path: String,
    /// Document bytes, base64-encoded for transport.
    pub content_base64: String,
    /// Signing deadline.
    pub deadline_at: DateTime<Utc>,
    /// Close the document once every signer has signed.
    pub auto_close: bool,
    /// Locale for provider-rendered pages.
    pub locale: String,
}

/// A party to register for signing.
#[derive(Debug, Clone)]
pub struct SignerRegistration {
    /// Full name.
    pub name: String,
    /// Signing channel e-mail.
    pub email: String,
    /// Government identification number.
    pub documentation: String,
    /// Contact phone, if available.
    pub phone: Option<String>,
}

/// The capacity in which a registered party signs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignerRole {
    /// The contracting party granting the mandate.
    Grantor,
    /// The brokerage's own signatory.
    Brokerage,
}

/// The three signing-provider operations the lifecycle needs.
#[async_trait]
pub trait SignatureGateway: Send + Sync {
    /// Upload a document; returns the provider document key.
    async fn submit_document(&self, req: &DocumentSubmission) -> Result<String, GatewayFailure>;

    /// Register a signing party; returns the provider signer key.
    async fn register_signer(&self, req: &SignerRegistration) -> Result<String, GatewayFailure>;

    /// Bind registered signers to a document as a signature request;
    /// returns the provider request key.
    async fn create_signature_request(
        &self,
        document_key: &str,
        signers: &[(String, SignerRole)],
    ) -> Result<String, GatewayFailure>;
}

#[async_trait]
impl SignatureGateway for ClicksignClient {
    async fn submit_document(&self, req: &DocumentSubmission) -> Result<String, GatewayFailure> {
        let request = SubmitDocumentRequest {
            path: req.path.clone(),
            content_base64: req.content_base64.clone(),
            deadline_at: req.deadline_at,
            auto_close: req.auto_close,
            locale: req.locale.clone(),
        };
        let document = self.documents().create(&request).await?;
        Ok(document.key)
    }

    async fn register_signer(&self, req: &SignerRegistration) -> Result<String, GatewayFailure> {
        let request = CreateSignerRequest::via_email(
            req.name.clone(),
            req.email.clone(),
            req.documentation.clone(),
            req.phone.clone(),
        );
        let signer = self.signers().create(&request).await?;
        Ok(signer.key)
    }

    async fn create_signature_request(
        &self,
        document_key: &str,
        signers: &[(String, SignerRole)],
    ) -> Result<String, GatewayFailure> {
        let request = CreateListRequest {
            document_key: document_key.to_string(),
            signers: signers
                .iter()
                .map(|(key, role)| ListSigner {
                    signer_key: key.clone(),
                    sign_as: match role {
                        SignerRole::Grantor => SignAs::Party,
                        SignerRole::Brokerage => SignAs::Contractor,
                    },
                })
                .collect(),
        };
        let list = self.lists().create(&request).await?;
        Ok(list.key)
    }
}
