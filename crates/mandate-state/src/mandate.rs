//! # Mandate Lifecycle State Machine
//!
//! A mandate is created in `Draft`, moves to `AwaitingSignature` when the
//! contract document has been handed to the signing provider, and reaches
//! `Signed` or `Canceled` only through a verified provider event.
//!
//! ```text
//! Draft ──submit──▶ AwaitingSignature ──document.signed───▶ Signed
//!                        │        │
//!                        │        └──document.canceled──▶ Canceled
//!                        └──deadline passed────────────▶ Expired
//! ```
//!
//! Once the status leaves `Draft`, the terms and the linked property/party
//! snapshots are immutable; edit and delete are rejected. Provider-driven
//! transitions are idempotent so that redelivered webhook events are benign.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use mandate_core::{ContractingParty, Property, Terms, ValidationError};

// ─── Status ──────────────────────────────────────────────────────────

/// Lifecycle status of a mandate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MandateStatus {
    /// Editable; nothing has been sent to the signing provider.
    Draft,
    /// Submitted to the signing provider; waiting for all signatures.
    AwaitingSignature,
    /// Fully executed. Terminal.
    Signed,
    /// Canceled at the signing provider. Terminal.
    Canceled,
    /// Signing deadline passed without completion. Terminal.
    Expired,
}

impl MandateStatus {
    /// The snake_case string stored in the database `status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::AwaitingSignature => "awaiting_signature",
            Self::Signed => "signed",
            Self::Canceled => "canceled",
            Self::Expired => "expired",
        }
    }

    /// Whether no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Signed | Self::Canceled | Self::Expired)
    }

    /// Whether the mandate is in-flight at the signing provider: submitted
    /// but neither completed nor terminal.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::AwaitingSignature)
    }
}

impl std::fmt::Display for MandateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MandateStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "awaiting_signature" => Ok(Self::AwaitingSignature),
            "signed" => Ok(Self::Signed),
            "canceled" => Ok(Self::Canceled),
            "expired" => Ok(Self::Expired),
            other => Err(format!("unknown mandate status: {other}")),
        }
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors raised by mandate lifecycle transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MandateError {
    /// The mandate has already been fully executed.
    #[error("mandate {id} has already been signed")]
    AlreadySigned {
        /// The mandate identifier.
        id: i64,
    },

    /// The requested operation is not allowed in the current status.
    #[error("cannot {operation} mandate {id} in status {status}")]
    InvalidState {
        /// The mandate identifier.
        id: i64,
        /// The current lifecycle status.
        status: MandateStatus,
        /// The operation that was attempted (e.g. "edit", "delete").
        operation: &'static str,
    },

    /// A provider event does not apply to the current status.
    #[error("event {event} does not apply to mandate {id} in status {status}")]
    InvalidTransition {
        /// The mandate identifier.
        id: i64,
        /// The current lifecycle status.
        status: MandateStatus,
        /// The provider event name.
        event: &'static str,
    },

    /// Submission cannot be completed before a document key is recorded.
    #[error("mandate {id} has no provider document key recorded")]
    MissingDocumentKey {
        /// The mandate identifier.
        id: i64,
    },

    /// A different provider document key is already recorded.
    #[error("mandate {id} already correlates to provider document {existing}")]
    DocumentKeyMismatch {
        /// The mandate identifier.
        id: i64,
        /// The key already recorded.
        existing: String,
    },
}

// ─── Event application outcome ───────────────────────────────────────

/// What applying a provider event actually changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventEffect {
    /// The lifecycle status changed.
    StatusChanged,
    /// Only the provider status mirror changed; lifecycle status untouched.
    MirrorOnly,
    /// The event had already been applied; nothing changed.
    AlreadyApplied,
}

// ─── Mandate ─────────────────────────────────────────────────────────

/// A sales mandate and its signing correlation state.
///
/// All status checks live in the methods of this type. Callers never match
/// on [`MandateStatus`] to decide whether an operation is allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mandate {
    /// Database-assigned identifier.
    pub id: i64,
    /// Snapshot of the property the mandate is granted against.
    pub property: Property,
    /// The party granting the mandate.
    pub party: ContractingParty,
    /// Id of the broker user who created the mandate.
    pub created_by: i64,
    /// Commercial terms. Immutable once the status leaves `Draft`.
    pub terms: Terms,
    /// Current lifecycle status.
    pub status: MandateStatus,
    /// Provider document key, recorded as soon as the document is submitted.
    pub document_key: Option<String>,
    /// Provider signature-request (list) key, recorded when parties are bound.
    pub request_key: Option<String>,
    /// The provider's own status vocabulary, mirrored for diagnostics.
    /// Independent of [`Mandate::status`].
    pub provider_status: Option<String>,
    /// Retrieval handle of the generated contract artifact.
    pub artifact_url: Option<String>,
    /// Logical filename of the generated contract artifact.
    pub artifact_filename: Option<String>,
    /// SHA-256 digest of the artifact bytes, hex-encoded.
    pub artifact_digest: Option<String>,
    /// When the mandate was created.
    pub created_at: DateTime<Utc>,
    /// When the mandate was last mutated.
    pub updated_at: DateTime<Utc>,
    /// When the final signature landed. Set exactly once.
    pub signed_at: Option<DateTime<Utc>>,
    /// Signing deadline, set when the mandate is sent for signature.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Mandate {
    /// Create a new mandate in `Draft`, validating party, property, and
    /// terms up front.
    pub fn new(
        id: i64,
        property: Property,
        party: ContractingParty,
        created_by: i64,
        terms: Terms,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        party.validate()?;
        property.validate()?;
        terms.validate()?;
        Ok(Self {
            id,
            property,
            party,
            created_by,
            terms,
            status: MandateStatus::Draft,
            document_key: None,
            request_key: None,
            provider_status: None,
            artifact_url: None,
            artifact_filename: None,
            artifact_digest: None,
            created_at: now,
            updated_at: now,
            signed_at: None,
            expires_at: None,
        })
    }

    // ── Submission-side transitions ──────────────────────────────────

    /// Check that a submission may start (or resume) from the current state.
    ///
    /// `Draft` is submittable — including a draft that already carries a
    /// document key from a previous partial submission, which resumes
    /// instead of resubmitting the document.
    pub fn ensure_submittable(&self) -> Result<(), MandateError> {
        match self.status {
            MandateStatus::Draft => Ok(()),
            MandateStatus::Signed => Err(MandateError::AlreadySigned { id: self.id }),
            status => Err(MandateError::InvalidState {
                id: self.id,
                status,
                operation: "submit",
            }),
        }
    }

    /// Record the generated artifact reference. Allowed only in `Draft`;
    /// regeneration before submission replaces the reference.
    pub fn record_artifact(
        &mut self,
        url: String,
        filename: String,
        digest: String,
        now: DateTime<Utc>,
    ) -> Result<(), MandateError> {
        self.require_draft("attach artifact to")?;
        self.artifact_url = Some(url);
        self.artifact_filename = Some(filename);
        self.artifact_digest = Some(digest);
        self.touch(now);
        Ok(())
    }

    /// Record the provider document key the moment it is obtained, before
    /// any further provider call. Recording the same key twice is a no-op;
    /// a conflicting key is rejected.
    pub fn record_document_key(
        &mut self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<(), MandateError> {
        self.require_draft("correlate a provider document to")?;
        match &self.document_key {
            Some(existing) if existing == key => Ok(()),
            Some(existing) => Err(MandateError::DocumentKeyMismatch {
                id: self.id,
                existing: existing.clone(),
            }),
            None => {
                self.document_key = Some(key.to_string());
                self.touch(now);
                Ok(())
            }
        }
    }

    /// Complete the submission: the signature request is bound at the
    /// provider. Moves `Draft → AwaitingSignature`, stores the request key
    /// and deadline, and mirrors the provider status as pending.
    pub fn complete_submission(
        &mut self,
        request_key: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), MandateError> {
        self.ensure_submittable()?;
        if self.document_key.is_none() {
            return Err(MandateError::MissingDocumentKey { id: self.id });
        }
        self.request_key = Some(request_key.to_string());
        self.provider_status = Some("pending".to_string());
        self.expires_at = Some(expires_at);
        self.status = MandateStatus::AwaitingSignature;
        self.touch(now);
        Ok(())
    }

    // ── Provider-event transitions ───────────────────────────────────

    /// Apply a `document.signed` event.
    ///
    /// `AwaitingSignature → Signed`, setting `signed_at` exactly once.
    /// Reapplying on an already-signed mandate is a no-op success.
    pub fn apply_document_signed(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<EventEffect, MandateError> {
        match self.status {
            MandateStatus::AwaitingSignature => {
                self.status = MandateStatus::Signed;
                self.signed_at = Some(now);
                self.provider_status = Some("signed".to_string());
                self.touch(now);
                Ok(EventEffect::StatusChanged)
            }
            MandateStatus::Signed => Ok(EventEffect::AlreadyApplied),
            status => Err(MandateError::InvalidTransition {
                id: self.id,
                status,
                event: "document.signed",
            }),
        }
    }

    /// Apply a `document.canceled` event.
    pub fn apply_document_canceled(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<EventEffect, MandateError> {
        match self.status {
            MandateStatus::AwaitingSignature => {
                self.status = MandateStatus::Canceled;
                self.provider_status = Some("canceled".to_string());
                self.touch(now);
                Ok(EventEffect::StatusChanged)
            }
            MandateStatus::Canceled => Ok(EventEffect::AlreadyApplied),
            status => Err(MandateError::InvalidTransition {
                id: self.id,
                status,
                event: "document.canceled",
            }),
        }
    }

    /// Apply a `signer.signed` event: partial progress. Updates only the
    /// provider status mirror; the lifecycle status is untouched. A partial
    /// event arriving after completion is a no-op.
    pub fn record_signer_progress(
        &mut self,
        provider_status: &str,
        now: DateTime<Utc>,
    ) -> Result<EventEffect, MandateError> {
        match self.status {
            MandateStatus::AwaitingSignature => {
                self.provider_status = Some(provider_status.to_string());
                self.touch(now);
                Ok(EventEffect::MirrorOnly)
            }
            MandateStatus::Signed | MandateStatus::Canceled => Ok(EventEffect::AlreadyApplied),
            status => Err(MandateError::InvalidTransition {
                id: self.id,
                status,
                event: "signer.signed",
            }),
        }
    }

    /// Mark the mandate expired once its signing deadline has passed.
    /// Invoked by an external scheduler; guards both the status and the
    /// deadline so an early call cannot expire a live mandate.
    pub fn mark_expired(&mut self, now: DateTime<Utc>) -> Result<EventEffect, MandateError> {
        match self.status {
            MandateStatus::AwaitingSignature
                if self.expires_at.is_some_and(|deadline| deadline <= now) =>
            {
                self.status = MandateStatus::Expired;
                self.touch(now);
                Ok(EventEffect::StatusChanged)
            }
            MandateStatus::Expired => Ok(EventEffect::AlreadyApplied),
            status => Err(MandateError::InvalidTransition {
                id: self.id,
                status,
                event: "deadline",
            }),
        }
    }

    // ── Draft-only operations ────────────────────────────────────────

    /// Replace the commercial terms. Allowed only in `Draft`.
    pub fn update_terms(&mut self, terms: Terms, now: DateTime<Utc>) -> Result<(), MandateError> {
        self.require_draft("edit")?;
        self.terms = terms;
        self.touch(now);
        Ok(())
    }

    /// Check that the mandate may be deleted (only while `Draft`).
    pub fn ensure_deletable(&self) -> Result<(), MandateError> {
        self.require_draft("delete")
    }

    fn require_draft(&self, operation: &'static str) -> Result<(), MandateError> {
        if self.status == MandateStatus::Draft {
            Ok(())
        } else {
            Err(MandateError::InvalidState {
                id: self.id,
                status: self.status,
                operation,
            })
        }
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use mandate_core::{PersonDetails, SpouseDetails};
    use rust_decimal::Decimal;

    fn party() -> ContractingParty {
        ContractingParty::MarriedIndividual {
            person: PersonDetails {
                full_name: "Bruno Lima".to_string(),
                email: "bruno.lima@example.com".to_string(),
                tax_id: "123.456.789-00".to_string(),
                phone: Some("+55 21 99999-0000".to_string()),
                nationality: Some("Brazilian".to_string()),
                occupation: Some("Engineer".to_string()),
            },
            spouse: SpouseDetails {
                full_name: "Carla Lima".to_string(),
                tax_id: "987.654.321-00".to_string(),
            },
        }
    }

    fn property() -> Property {
        Property {
            id: 42,
            registry_number: "M-55.123".to_string(),
            address: "Rua das Laranjeiras, 100".to_string(),
            city: "Rio de Janeiro".to_string(),
            state: "RJ".to_string(),
            postal_code: None,
            description: None,
        }
    }

    fn terms() -> Terms {
        Terms {
            exclusivity_days: 0,
            commission_percent: Decimal::from(6),
        }
    }

    fn draft() -> Mandate {
        Mandate::new(1, property(), party(), 7, terms(), Utc::now()).unwrap()
    }

    fn awaiting() -> Mandate {
        let mut m = draft();
        let now = Utc::now();
        m.record_document_key("D1", now).unwrap();
        m.complete_submission("R1", now + chrono::Duration::days(90), now)
            .unwrap();
        m
    }

    // ── Construction ─────────────────────────────────────────────────

    #[test]
    fn new_mandate_starts_in_draft_with_no_provider_refs() {
        let m = draft();
        assert_eq!(m.status, MandateStatus::Draft);
        assert!(m.document_key.is_none());
        assert!(m.request_key.is_none());
        assert!(m.expires_at.is_none());
        assert!(m.signed_at.is_none());
    }

    #[test]
    fn new_mandate_rejects_invalid_party() {
        let bad = ContractingParty::CoOwners { owners: vec![] };
        let result = Mandate::new(1, property(), bad, 7, terms(), Utc::now());
        assert!(result.is_err());
    }

    // ── Submission transitions ───────────────────────────────────────

    #[test]
    fn complete_submission_requires_document_key() {
        let mut m = draft();
        let now = Utc::now();
        let result = m.complete_submission("R1", now, now);
        assert_eq!(result, Err(MandateError::MissingDocumentKey { id: 1 }));
        assert_eq!(m.status, MandateStatus::Draft);
    }

    #[test]
    fn complete_submission_moves_to_awaiting_signature() {
        let m = awaiting();
        assert_eq!(m.status, MandateStatus::AwaitingSignature);
        assert_eq!(m.document_key.as_deref(), Some("D1"));
        assert_eq!(m.request_key.as_deref(), Some("R1"));
        assert_eq!(m.provider_status.as_deref(), Some("pending"));
        assert!(m.expires_at.is_some());
    }

    #[test]
    fn record_document_key_is_idempotent_for_same_key() {
        let mut m = draft();
        let now = Utc::now();
        m.record_document_key("D1", now).unwrap();
        assert!(m.record_document_key("D1", now).is_ok());
        assert_eq!(m.document_key.as_deref(), Some("D1"));
    }

    #[test]
    fn record_document_key_rejects_conflicting_key() {
        let mut m = draft();
        let now = Utc::now();
        m.record_document_key("D1", now).unwrap();
        assert_eq!(
            m.record_document_key("D2", now),
            Err(MandateError::DocumentKeyMismatch {
                id: 1,
                existing: "D1".to_string(),
            })
        );
    }

    #[test]
    fn signed_mandate_is_not_submittable() {
        let mut m = awaiting();
        m.apply_document_signed(Utc::now()).unwrap();
        assert_eq!(
            m.ensure_submittable(),
            Err(MandateError::AlreadySigned { id: 1 })
        );
    }

    #[test]
    fn awaiting_mandate_is_not_submittable() {
        let m = awaiting();
        assert!(matches!(
            m.ensure_submittable(),
            Err(MandateError::InvalidState {
                operation: "submit",
                ..
            })
        ));
    }

    // ── Provider events ──────────────────────────────────────────────

    #[test]
    fn document_signed_sets_signed_at_exactly_once() {
        let mut m = awaiting();
        let first = Utc::now();
        assert_eq!(
            m.apply_document_signed(first).unwrap(),
            EventEffect::StatusChanged
        );
        assert_eq!(m.status, MandateStatus::Signed);
        let signed_at = m.signed_at.unwrap();

        // Redelivery: no error, no change.
        let effect = m
            .apply_document_signed(first + chrono::Duration::minutes(5))
            .unwrap();
        assert_eq!(effect, EventEffect::AlreadyApplied);
        assert_eq!(m.signed_at.unwrap(), signed_at);
    }

    #[test]
    fn document_signed_on_draft_is_rejected() {
        let mut m = draft();
        let result = m.apply_document_signed(Utc::now());
        assert!(matches!(
            result,
            Err(MandateError::InvalidTransition {
                event: "document.signed",
                ..
            })
        ));
    }

    #[test]
    fn document_canceled_moves_to_canceled() {
        let mut m = awaiting();
        assert_eq!(
            m.apply_document_canceled(Utc::now()).unwrap(),
            EventEffect::StatusChanged
        );
        assert_eq!(m.status, MandateStatus::Canceled);
        assert_eq!(m.provider_status.as_deref(), Some("canceled"));
        assert!(m.signed_at.is_none());
    }

    #[test]
    fn signer_progress_updates_mirror_only() {
        let mut m = awaiting();
        let effect = m.record_signer_progress("running", Utc::now()).unwrap();
        assert_eq!(effect, EventEffect::MirrorOnly);
        assert_eq!(m.status, MandateStatus::AwaitingSignature);
        assert_eq!(m.provider_status.as_deref(), Some("running"));
    }

    #[test]
    fn late_signer_progress_after_signing_is_noop() {
        let mut m = awaiting();
        m.apply_document_signed(Utc::now()).unwrap();
        let effect = m.record_signer_progress("running", Utc::now()).unwrap();
        assert_eq!(effect, EventEffect::AlreadyApplied);
        assert_eq!(m.provider_status.as_deref(), Some("signed"));
    }

    // ── Expiry ───────────────────────────────────────────────────────

    #[test]
    fn mark_expired_after_deadline() {
        let mut m = awaiting();
        let past_deadline = m.expires_at.unwrap() + chrono::Duration::hours(1);
        assert_eq!(
            m.mark_expired(past_deadline).unwrap(),
            EventEffect::StatusChanged
        );
        assert_eq!(m.status, MandateStatus::Expired);
    }

    #[test]
    fn mark_expired_before_deadline_rejected() {
        let mut m = awaiting();
        let result = m.mark_expired(Utc::now());
        assert!(result.is_err());
        assert_eq!(m.status, MandateStatus::AwaitingSignature);
    }

    // ── Immutability after submission ────────────────────────────────

    #[test]
    fn edit_rejected_after_submission_and_record_unchanged() {
        let mut m = awaiting();
        let before = m.clone();
        let new_terms = Terms {
            exclusivity_days: 10,
            commission_percent: Decimal::from(8),
        };
        let result = m.update_terms(new_terms, Utc::now());
        assert!(matches!(
            result,
            Err(MandateError::InvalidState {
                operation: "edit",
                ..
            })
        ));
        assert_eq!(m, before);
    }

    #[test]
    fn edit_allowed_in_draft() {
        let mut m = draft();
        let new_terms = Terms {
            exclusivity_days: 30,
            commission_percent: Decimal::from(5),
        };
        m.update_terms(new_terms, Utc::now()).unwrap();
        assert_eq!(m.terms.exclusivity_days, 30);
    }

    #[test]
    fn delete_rejected_after_submission() {
        let m = awaiting();
        assert!(m.ensure_deletable().is_err());
        assert!(draft().ensure_deletable().is_ok());
    }

    // ── Status parsing/formatting ────────────────────────────────────

    #[test]
    fn status_roundtrips_through_str() {
        for status in [
            MandateStatus::Draft,
            MandateStatus::AwaitingSignature,
            MandateStatus::Signed,
            MandateStatus::Canceled,
            MandateStatus::Expired,
        ] {
            let parsed: MandateStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("rejected".parse::<MandateStatus>().is_err());
    }

    #[test]
    fn terminal_and_in_flight_classification() {
        assert!(!MandateStatus::Draft.is_terminal());
        assert!(!MandateStatus::AwaitingSignature.is_terminal());
        assert!(MandateStatus::AwaitingSignature.is_in_flight());
        assert!(MandateStatus::Signed.is_terminal());
        assert!(MandateStatus::Canceled.is_terminal());
        assert!(MandateStatus::Expired.is_terminal());
        assert!(!MandateStatus::Signed.is_in_flight());
    }

    #[test]
    fn mandate_serde_roundtrip() {
        let m = awaiting();
        let json = serde_json::to_string(&m).unwrap();
        let parsed: Mandate = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, m);
    }
}
