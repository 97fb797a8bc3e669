//! # Submission Phase — Resume Machine
//!
//! A submission to the signing provider is a sequence of externally-visible
//! sub-steps. Each completed sub-step persists its external key before the
//! next one runs, so a submission that fails midway leaves enough state to
//! resume from the last completed sub-step instead of restarting — blindly
//! restarting would submit a duplicate document at the provider.
//!
//! ```text
//! NotStarted ──submit document──▶ DocumentSubmitted
//!            ──register signers─▶ PartiesRegistered
//!            ──bind list────────▶ Bound
//!            ──persist──────────▶ Persisted
//! ```
//!
//! Only the document and request keys are persisted on the mandate; signer
//! keys are ephemeral. A resumed submission therefore re-registers signers —
//! an unbound signer at the provider is inert, while a duplicate document is
//! not.

use serde::{Deserialize, Serialize};

use crate::mandate::{Mandate, MandateStatus};

/// How far a submission has progressed, derived from the external keys
/// already persisted on the mandate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionPhase {
    /// No provider call has succeeded yet.
    NotStarted,
    /// The document exists at the provider; no signature request binds it.
    DocumentSubmitted,
    /// Signing parties are registered (in-memory progress only).
    PartiesRegistered,
    /// The signature request is bound at the provider.
    Bound,
    /// The mandate record reflects the completed submission.
    Persisted,
}

impl SubmissionPhase {
    /// Derive the resumable phase from a mandate's persisted state.
    ///
    /// `PartiesRegistered` is never derived: signer keys are not persisted,
    /// so a resume from `DocumentSubmitted` re-registers the signers.
    pub fn of(mandate: &Mandate) -> Self {
        if mandate.status == MandateStatus::AwaitingSignature {
            return Self::Persisted;
        }
        match (&mandate.document_key, &mandate.request_key) {
            (Some(_), Some(_)) => Self::Bound,
            (Some(_), None) => Self::DocumentSubmitted,
            (None, _) => Self::NotStarted,
        }
    }

    /// Whether the document-submission call must still be made.
    pub fn needs_document_submission(&self) -> bool {
        matches!(self, Self::NotStarted)
    }
}

impl std::fmt::Display for SubmissionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotStarted => "not_started",
            Self::DocumentSubmitted => "document_submitted",
            Self::PartiesRegistered => "parties_registered",
            Self::Bound => "bound",
            Self::Persisted => "persisted",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mandate_core::{ContractingParty, PersonDetails, Property, Terms};
    use rust_decimal::Decimal;

    fn draft() -> Mandate {
        Mandate::new(
            9,
            Property {
                id: 3,
                registry_number: "M-1".to_string(),
                address: "Av. Paulista, 1000".to_string(),
                city: "São Paulo".to_string(),
                state: "SP".to_string(),
                postal_code: None,
                description: None,
            },
            ContractingParty::Individual {
                person: PersonDetails {
                    full_name: "Ana Souza".to_string(),
                    email: "ana@example.com".to_string(),
                    tax_id: "111.222.333-44".to_string(),
                    phone: None,
                    nationality: None,
                    occupation: None,
                },
            },
            1,
            Terms {
                exclusivity_days: 0,
                commission_percent: Decimal::from(6),
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn fresh_draft_has_not_started() {
        let m = draft();
        let phase = SubmissionPhase::of(&m);
        assert_eq!(phase, SubmissionPhase::NotStarted);
        assert!(phase.needs_document_submission());
    }

    #[test]
    fn draft_with_document_key_resumes_from_document_submitted() {
        let mut m = draft();
        m.record_document_key("D2", Utc::now()).unwrap();
        let phase = SubmissionPhase::of(&m);
        assert_eq!(phase, SubmissionPhase::DocumentSubmitted);
        assert!(!phase.needs_document_submission());
    }

    #[test]
    fn completed_submission_is_persisted() {
        let mut m = draft();
        let now = Utc::now();
        m.record_document_key("D1", now).unwrap();
        m.complete_submission("R1", now + chrono::Duration::days(90), now)
            .unwrap();
        assert_eq!(SubmissionPhase::of(&m), SubmissionPhase::Persisted);
    }

    #[test]
    fn phase_ordering_matches_sequence() {
        assert!(SubmissionPhase::NotStarted < SubmissionPhase::DocumentSubmitted);
        assert!(SubmissionPhase::DocumentSubmitted < SubmissionPhase::PartiesRegistered);
        assert!(SubmissionPhase::PartiesRegistered < SubmissionPhase::Bound);
        assert!(SubmissionPhase::Bound < SubmissionPhase::Persisted);
    }
}
