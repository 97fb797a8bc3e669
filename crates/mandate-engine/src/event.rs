//! # Provider Event Taxonomy
//!
//! The provider posts loosely-shaped JSON. This module parses it into a
//! closed union at the boundary, so nothing downstream handles raw maps.
//! Structurally invalid payloads are rejected here; event names this
//! codebase does not know become [`WebhookEvent::Unknown`] and are
//! acknowledged without effect (forward compatibility).
//!
//! Wire shape:
//!
//! ```json
//! {"event": {"name": "document.signed",
//!            "data": {"document": {"key": "..."},
//!                     "signer": {"email": "..."}}}}
//! ```

use serde::Deserialize;
use thiserror::Error;

/// The webhook payload could not be turned into an event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedEventError {
    /// The body is not valid JSON or misses the event envelope.
    #[error("malformed webhook payload: {0}")]
    Json(String),

    /// The event carries no provider document reference.
    #[error("webhook event {name} carries no document key")]
    MissingDocumentKey {
        /// The event name, for diagnostics.
        name: String,
    },
}

/// A provider event, parsed at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    /// All parties signed; the document is executed.
    DocumentSigned {
        /// Provider document key.
        document_key: String,
    },
    /// The document was canceled at the provider.
    DocumentCanceled {
        /// Provider document key.
        document_key: String,
    },
    /// One party signed; others are still pending.
    SignerSigned {
        /// Provider document key.
        document_key: String,
        /// The signer's e-mail, when the provider includes it.
        signer_email: Option<String>,
    },
    /// An event name this codebase does not know. Acknowledged, no effect.
    Unknown {
        /// The unrecognized event name.
        name: String,
        /// Provider document key.
        document_key: String,
    },
}

#[derive(Deserialize)]
struct Envelope {
    event: EventBody,
}

#[derive(Deserialize)]
struct EventBody {
    name: String,
    #[serde(default)]
    data: EventData,
}

#[derive(Deserialize, Default)]
struct EventData {
    #[serde(default)]
    document: Option<DocumentRef>,
    #[serde(default)]
    signer: Option<SignerRef>,
}

#[derive(Deserialize)]
struct DocumentRef {
    key: String,
}

#[derive(Deserialize)]
struct SignerRef {
    #[serde(default)]
    email: Option<String>,
}

impl WebhookEvent {
    /// Parse a raw webhook body.
    pub fn parse(raw: &[u8]) -> Result<Self, MalformedEventError> {
        let envelope: Envelope = serde_json::from_slice(raw)
            .map_err(|e| MalformedEventError::Json(e.to_string()))?;

        let EventBody { name, data } = envelope.event;
        let document_key = data
            .document
            .map(|d| d.key)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| MalformedEventError::MissingDocumentKey { name: name.clone() })?;

        Ok(match name.as_str() {
            "document.signed" => Self::DocumentSigned { document_key },
            "document.canceled" => Self::DocumentCanceled { document_key },
            "signer.signed" => Self::SignerSigned {
                document_key,
                signer_email: data.signer.and_then(|s| s.email),
            },
            _ => Self::Unknown {
                name,
                document_key,
            },
        })
    }

    /// The provider document key the event references.
    pub fn document_key(&self) -> &str {
        match self {
            Self::DocumentSigned { document_key }
            | Self::DocumentCanceled { document_key }
            | Self::SignerSigned { document_key, .. }
            | Self::Unknown { document_key, .. } => document_key,
        }
    }

    /// The event name, for logging.
    pub fn name(&self) -> &str {
        match self {
            Self::DocumentSigned { .. } => "document.signed",
            Self::DocumentCanceled { .. } => "document.canceled",
            Self::SignerSigned { .. } => "signer.signed",
            Self::Unknown { name, .. } => name,
        }
    }
}
