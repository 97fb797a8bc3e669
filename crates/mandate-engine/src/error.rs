//! # Engine Error Taxonomy
//!
//! One error type for the whole orchestration surface, with an explicit
//! [`ErrorClass`] so callers pick the recovery strategy by kind rather than
//! by matching variants:
//!
//! | Class             | Recovery |
//! |-------------------|----------|
//! | Validation        | Fix the input; never retried automatically |
//! | Conflict          | Re-fetch current state and decide |
//! | NotFound          | Nothing to act on |
//! | Transient         | Safe to retry — no provider-side state was created |
//! | PartialCompletion | Resume (document key is persisted) or intervene; a blind re-invoke would duplicate provider state |
//! | Unauthorized      | Reject the webhook delivery |
//! | Malformed         | Reject the webhook delivery |
//! | Internal          | Operator attention |

use thiserror::Error;

use mandate_artifact::{GenerationError, StoreError};
use mandate_core::ValidationError;
use mandate_state::MandateError;

use crate::event::MalformedEventError;
use crate::gateway::GatewayFailure;
use crate::repo::RepoError;

/// Coarse classification of an [`EngineError`], used for HTTP mapping and
/// retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Input is invalid; never retried automatically.
    Validation,
    /// The operation conflicts with the record's current state.
    Conflict,
    /// The referenced record does not exist.
    NotFound,
    /// Infrastructure hiccup with no provider-side state created; safe to
    /// retry.
    Transient,
    /// Provider-side state exists that the failed operation did not finish
    /// binding; requires resume or manual intervention, never a blind retry.
    PartialCompletion,
    /// Webhook authenticity could not be established.
    Unauthorized,
    /// Webhook payload is structurally invalid.
    Malformed,
    /// Unexpected internal failure.
    Internal,
}

/// Errors surfaced by the lifecycle controller and webhook reconciler.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The mandate does not exist.
    #[error("mandate {id} not found")]
    NotFound {
        /// The missing id.
        id: i64,
    },

    /// Domain input failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Contract generation failed; no external call was made.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// A lifecycle state guard rejected the operation.
    #[error(transparent)]
    State(#[from] MandateError),

    /// Another writer modified the mandate between read and write.
    #[error("mandate {id} was modified concurrently; re-fetch and retry")]
    Concurrency {
        /// The contested mandate.
        id: i64,
    },

    /// Artifact storage failed.
    #[error("artifact storage failed: {0}")]
    Storage(#[from] StoreError),

    /// A gateway call failed before any provider-side state was created.
    /// The submission is safely retryable.
    #[error("signing gateway call failed: {0}")]
    Gateway(GatewayFailure),

    /// The provider document exists but no signature request binds it.
    /// The document key is persisted on the mandate, so a retry resumes
    /// from signer registration instead of resubmitting the document.
    #[error(
        "submission of mandate {id} partially completed: provider document \
         {document_key} has no bound signature request yet: {detail}"
    )]
    PartialSubmission {
        /// The mandate being submitted.
        id: i64,
        /// The provider document that exists without a signature request.
        document_key: String,
        /// What failed after the document was created.
        detail: String,
    },

    /// Every provider call succeeded but the final persist did not; the
    /// provider-side flow is live while the record still reads draft.
    /// Retry the persist, never the provider calls.
    #[error(
        "mandate {id}: signing flow started (document {document_key}, request \
         {request_key}) but the final persist failed: {detail}"
    )]
    Finalize {
        /// The mandate being submitted.
        id: i64,
        /// The provider document key.
        document_key: String,
        /// The provider request key.
        request_key: String,
        /// The persist failure.
        detail: String,
    },

    /// Repository failure outside the conflict/not-found cases.
    #[error("repository failure: {0}")]
    Repository(String),

    /// Webhook signature verification failed.
    #[error("webhook rejected: {0}")]
    SignatureRejected(String),

    /// Webhook payload could not be parsed.
    #[error(transparent)]
    MalformedEvent(#[from] MalformedEventError),

    /// Webhook references a provider document no mandate correlates to.
    #[error("no mandate correlates to provider document {key}")]
    UnknownDocument {
        /// The unmatched provider document key.
        key: String,
    },
}

impl EngineError {
    /// Classify this error for HTTP mapping and retry decisions.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Validation(_) | Self::Generation(_) => ErrorClass::Validation,
            Self::State(_) | Self::Concurrency { .. } => ErrorClass::Conflict,
            Self::NotFound { .. } | Self::UnknownDocument { .. } => ErrorClass::NotFound,
            Self::Storage(e) if e.is_transient() => ErrorClass::Transient,
            Self::Storage(_) => ErrorClass::Internal,
            Self::Gateway(_) => ErrorClass::Transient,
            Self::PartialSubmission { .. } | Self::Finalize { .. } => {
                ErrorClass::PartialCompletion
            }
            Self::Repository(_) => ErrorClass::Internal,
            Self::SignatureRejected(_) => ErrorClass::Unauthorized,
            Self::MalformedEvent(_) => ErrorClass::Malformed,
        }
    }
}

impl From<RepoError> for EngineError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound { id } => Self::NotFound { id },
            RepoError::Conflict { id, .. } => Self::Concurrency { id },
            RepoError::Storage(msg) => Self::Repository(msg),
        }
    }
}
