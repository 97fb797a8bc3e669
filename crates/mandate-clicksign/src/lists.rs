//! Typed client for Clicksign signature lists.
//!
//! | Method | Path            | Operation |
//! |--------|-----------------|-----------|
//! | POST   | `/api/v1/lists` | Bind signers to a document as a signature request |
//!
//! Binding is the step that actually starts the signing flow: the provider
//! notifies every listed signer and begins tracking progress under the
//! returned request key.

use serde::{Deserialize, Serialize};

use crate::error::ClicksignError;

/// The capacity in which a party signs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignAs {
    /// The party granting the mandate.
    Party,
    /// The brokerage bound by the mandate.
    Contractor,
    /// A witness to the agreement.
    Witness,
}

/// One signer entry in a signature list.
#[derive(Debug, Clone, Serialize)]
pub struct ListSigner {
    /// Key returned by signer registration.
    pub signer_key: String,
    /// Capacity in which this party signs.
    pub sign_as: SignAs,
}

/// Request to bind signers to a document.
#[derive(Debug, Clone, Serialize)]
pub struct CreateListRequest {
    /// Key of the uploaded document.
    pub document_key: String,
    /// Signers in signing order.
    pub signers: Vec<ListSigner>,
}

/// Signature list as returned by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct SignatureList {
    /// Opaque signature-request key.
    pub key: String,
    /// Provider-side request status.
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Serialize)]
struct ListEnvelope<'a> {
    list: &'a CreateListRequest,
}

#[derive(Deserialize)]
struct ListResponseEnvelope {
    list: SignatureList,
}

/// Client for the Clicksign lists resource.
#[derive(Debug, Clone)]
pub struct ListsClient {
    http: reqwest::Client,
    base_url: url::Url,
    access_token: String,
}

impl ListsClient {
    pub(crate) fn new(http: reqwest::Client, base_url: url::Url, access_token: String) -> Self {
        Self {
            http,
            base_url,
            access_token,
        }
    }

    /// Bind the given signers to a document as a signature request.
    ///
    /// Calls `POST {base_url}/api/v1/lists`.
    pub async fn create(&self, req: &CreateListRequest) -> Result<SignatureList, ClicksignError> {
        let endpoint = "POST /lists";
        let url = format!("{}api/v1/lists", self.base_url);

        let resp = self
            .http
            .post(&url)
            .query(&[("access_token", self.access_token.as_str())])
            .json(&ListEnvelope { list: req })
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

        resp.json::<ListResponseEnvelope>()
            .await
            .map(|env| env.list)
            .map_err(|e| ClicksignError::Deserialization {
                endpoint: endpoint.into(),
                source: e,
            })
    }
}
