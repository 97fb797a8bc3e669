//! Clicksign client configuration.
//!
//! Defaults point at the production endpoint; override via environment
//! variables or explicit construction for sandbox/testing.

use url::Url;
use zeroize::Zeroizing;

/// Configuration for connecting to the Clicksign API.
///
/// Custom `Debug` implementation redacts the access token to prevent
/// credential leakage in log output.
#[derive(Clone)]
pub struct ClicksignConfig {
    /// Base URL of the Clicksign instance.
    /// Default: <https://app.clicksign.com>
    pub base_url: Url,
    /// API access token, passed as the `access_token` query parameter.
    pub access_token: Zeroizing<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Locale requested for provider-rendered signing pages.
    pub locale: String,
}

impl std::fmt::Debug for ClicksignConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClicksignConfig")
            .field("base_url", &self.base_url)
            .field("access_token", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .field("locale", &self.locale)
            .finish()
    }
}

impl ClicksignConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `CLICKSIGN_BASE_URL` (default: `https://app.clicksign.com`)
    /// - `CLICKSIGN_ACCESS_TOKEN` (required)
    /// - `CLICKSIGN_TIMEOUT_SECS` (default: 30)
    /// - `CLICKSIGN_LOCALE` (default: `pt-BR`)
    pub fn from_env() -> Result<Self, ConfigError> {
        let access_token = std::env::var("CLICKSIGN_ACCESS_TOKEN")
            .map(Zeroizing::new)
            .map_err(|_| ConfigError::MissingToken)?;

        let raw_url = std::env::var("CLICKSIGN_BASE_URL")
            .unwrap_or_else(|_| "https://app.clicksign.com".to_string());
        let base_url = Url::parse(&raw_url)
            .map_err(|e| ConfigError::InvalidUrl("CLICKSIGN_BASE_URL".to_string(), e.to_string()))?;

        Ok(Self {
            base_url,
            access_token,
            timeout_secs: std::env::var("CLICKSIGN_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            locale: std::env::var("CLICKSIGN_LOCALE").unwrap_or_else(|_| "pt-BR".to_string()),
        })
    }

    /// Create a configuration pointing at a local mock server (for testing).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if `base_url` cannot be parsed.
    pub fn local_mock(base_url: &str, token: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: Url::parse(base_url)
                .map_err(|e| ConfigError::InvalidUrl("base_url".to_string(), e.to_string()))?,
            access_token: Zeroizing::new(token.to_string()),
            timeout_secs: 5,
            locale: "pt-BR".to_string(),
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("CLICKSIGN_ACCESS_TOKEN environment variable is required")]
    MissingToken,
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_mock_builds_valid_config() {
        let cfg = ClicksignConfig::local_mock("http://127.0.0.1:9100", "tok").unwrap();
        assert_eq!(cfg.base_url.as_str(), "http://127.0.0.1:9100/");
        assert_eq!(cfg.timeout_secs, 5);
        assert_eq!(cfg.locale, "pt-BR");
    }

    #[test]
    fn local_mock_rejects_invalid_url() {
        assert!(ClicksignConfig::local_mock("not a url", "tok").is_err());
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = ClicksignConfig::local_mock("http://127.0.0.1:9100", "super-secret").unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
