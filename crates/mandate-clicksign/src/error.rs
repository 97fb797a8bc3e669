//! Clicksign client error types.

/// Errors from Clicksign API calls.
#[derive(Debug, thiserror::Error)]
pub enum ClicksignError {
    /// HTTP transport error — the request never produced a response.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Clicksign returned a non-2xx status.
    #[error("Clicksign {endpoint} returned {status}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl ClicksignError {
    /// Whether the call failed before the provider could have acted on it.
    ///
    /// Transport errors are ambiguous — the request may or may not have
    /// reached the provider — so they are deliberately NOT classified as
    /// safe to replay for non-idempotent endpoints.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
