//! Typed client for Clicksign signer registration.
//!
//! | Method | Path              | Operation |
//! |--------|-------------------|-----------|
//! | POST   | `/api/v1/signers` | Register a signing party |

use serde::{Deserialize, Serialize};

use crate::error::ClicksignError;

/// Request to register a signer.
#[derive(Debug, Clone, Serialize)]
pub struct CreateSignerRequest {
    /// Signer's full name.
    pub name: String,
    /// Signing channel e-mail.
    pub email: String,
    /// Government identification number.
    pub documentation: String,
    /// Contact phone, if available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// Authentication methods the provider should offer.
    pub auths: Vec<String>,
}

impl CreateSignerRequest {
    /// A signer authenticated by e-mail token, the default channel.
    pub fn via_email(
        name: impl Into<String>,
        email: impl Into<String>,
        documentation: impl Into<String>,
        phone_number: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            documentation: documentation.into(),
            phone_number,
            auths: vec!["email".to_string()],
        }
    }
}

/// Signer as returned by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct Signer {
    /// Opaque signer key.
    pub key: String,
    /// E-mail the provider registered.
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Serialize)]
struct SignerEnvelope<'a> {
    signer: &'a CreateSignerRequest,
}

#[derive(Deserialize)]
struct SignerResponseEnvelope {
    signer: Signer,
}

/// Client for the Clicksign signers resource.
#[derive(Debug, Clone)]
pub struct SignersClient {
    http: reqwest::Client,
    base_url: url::Url,
    access_token: String,
}

impl SignersClient {
    pub(crate) fn new(http: reqwest::Client, base_url: url::Url, access_token: String) -> Self {
        Self {
            http,
            base_url,
            access_token,
        }
    }

    /// Register a signing party.
    ///
    /// Calls `POST {base_url}/api/v1/signers`. The returned key is only
    /// meaningful until bound to a document via a signature list; unbound
    /// signers are inert on the provider side.
    pub async fn create(&self, req: &CreateSignerRequest) -> Result<Signer, ClicksignError> {
        let endpoint = "POST /signers";
        let url = format!("{}api/v1/signers", self.base_url);

        let resp = self
            .http
            .post(&url)
            .query(&[("access_token", self.access_token.as_str())])
            .json(&SignerEnvelope { signer: req })
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

        resp.json::<SignerResponseEnvelope>()
            .await
            .map(|env| env.signer)
            .map_err(|e| ClicksignError::Deserialization {
                endpoint: endpoint.into(),
                source: e,
            })
    }
}
