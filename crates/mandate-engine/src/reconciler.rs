//! # Webhook Reconciler
//!
//! Entry point for inbound provider events: verifies authenticity, parses
//! the payload into the closed event union, and applies it through the
//! lifecycle controller.
//!
//! ## Signature verification
//!
//! The provider signs each delivery with HMAC-SHA256 over the raw body,
//! sent as `Content-Hmac: sha256=<hex>`. Verification recomputes the MAC
//! with the shared secret and compares in constant time.
//!
//! Running without a secret is an explicit configuration choice
//! ([`WebhookConfig::allow_unsigned`]), aimed at environments where the
//! secret is not provisioned. With the flag off and no secret configured,
//! every delivery is rejected — the fail-closed production posture.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use mandate_artifact::ArtifactStore;

use crate::controller::{LifecycleController, ReconcileOutcome};
use crate::error::EngineError;
use crate::event::WebhookEvent;
use crate::gateway::SignatureGateway;
use crate::repo::MandateRepository;

type HmacSha256 = Hmac<Sha256>;

/// Header value prefix for the delivery signature.
const SIGNATURE_PREFIX: &str = "sha256=";

/// Webhook verification configuration.
///
/// Custom `Debug` redacts the secret.
#[derive(Clone)]
pub struct WebhookConfig {
    /// Shared HMAC secret, as configured at the provider.
    pub secret: Option<Zeroizing<String>>,
    /// Accept unsigned deliveries when no secret is configured. Explicit
    /// opt-in; with this off and no secret set, all deliveries are
    /// rejected.
    pub allow_unsigned: bool,
}

impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("allow_unsigned", &self.allow_unsigned)
            .finish()
    }
}

impl WebhookConfig {
    /// Load from environment variables: `CLICKSIGN_WEBHOOK_SECRET` and
    /// `WEBHOOK_ALLOW_UNSIGNED` (`1`/`true` to enable the permissive mode).
    pub fn from_env() -> Self {
        Self {
            secret: std::env::var("CLICKSIGN_WEBHOOK_SECRET")
                .ok()
                .filter(|s| !s.is_empty())
                .map(Zeroizing::new),
            allow_unsigned: std::env::var("WEBHOOK_ALLOW_UNSIGNED")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }
}

/// Compute the delivery signature for a body: `sha256=<hex>`.
///
/// Exposed so tests and delivery tooling produce exactly what verification
/// expects.
pub fn compute_signature(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC-SHA256 accepts keys of any length");
    mac.update(body);
    format!(
        "{SIGNATURE_PREFIX}{}",
        hex::encode(mac.finalize().into_bytes())
    )
}

/// Verify a delivery signature against the raw body under the given
/// configuration.
pub fn verify_signature(
    config: &WebhookConfig,
    raw_body: &[u8],
    signature_header: Option<&str>,
) -> Result<(), EngineError> {
    let Some(secret) = &config.secret else {
        if config.allow_unsigned {
            tracing::warn!(
                "no webhook secret configured — accepting unsigned delivery \
                 (allow_unsigned is enabled)"
            );
            return Ok(());
        }
        return Err(EngineError::SignatureRejected(
            "no webhook secret configured and unsigned deliveries are not allowed".to_string(),
        ));
    };

    let Some(header) = signature_header else {
        return Err(EngineError::SignatureRejected(
            "missing signature header".to_string(),
        ));
    };
    let Some(provided_hex) = header.strip_prefix(SIGNATURE_PREFIX) else {
        return Err(EngineError::SignatureRejected(format!(
            "signature header must start with {SIGNATURE_PREFIX}"
        )));
    };
    let provided = hex::decode(provided_hex)
        .map_err(|_| EngineError::SignatureRejected("signature is not valid hex".to_string()))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC-SHA256 accepts keys of any length");
    mac.update(raw_body);
    let expected = mac.finalize().into_bytes();

    if provided.len() != expected.len() {
        // Dummy comparison keeps timing independent of the length check.
        let _ = expected.ct_eq(&expected);
        return Err(EngineError::SignatureRejected(
            "signature mismatch".to_string(),
        ));
    }
    if bool::from(provided.ct_eq(&expected)) {
        Ok(())
    } else {
        Err(EngineError::SignatureRejected(
            "signature mismatch".to_string(),
        ))
    }
}

/// Verifies and applies inbound provider events.
#[derive(Debug)]
pub struct WebhookReconciler<R, G, A> {
    config: WebhookConfig,
    controller: LifecycleController<R, G, A>,
}

impl<R, G, A> WebhookReconciler<R, G, A>
where
    R: MandateRepository,
    G: SignatureGateway,
    A: ArtifactStore,
{
    /// Create a reconciler applying events through `controller`.
    pub fn new(config: WebhookConfig, controller: LifecycleController<R, G, A>) -> Self {
        Self { config, controller }
    }

    /// Access the underlying controller.
    pub fn controller(&self) -> &LifecycleController<R, G, A> {
        &self.controller
    }

    /// Handle one raw delivery: verify, parse, apply.
    pub async fn handle(
        &self,
        raw_body: &[u8],
        signature_header: Option<&str>,
    ) -> Result<ReconcileOutcome, EngineError> {
        verify_signature(&self.config, raw_body, signature_header)?;
        let event = WebhookEvent::parse(raw_body)?;
        let outcome = self.controller.apply_event(&event).await?;
        tracing::info!(
            mandate_id = outcome.mandate_id(),
            event = event.name(),
            outcome = ?outcome,
            "webhook reconciled"
        );
        Ok(outcome)
    }
}
