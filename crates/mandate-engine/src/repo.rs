//! # Mandate Repository Seam
//!
//! Persistence sits behind this trait so the controller can be exercised
//! against in-memory fakes and wired to any durable store.
//!
//! The single write method is a conditional update: it succeeds only if the
//! stored status still matches what the caller read. Both the submission
//! path and the webhook path read-then-write the same record with no
//! surrounding lock; the conditional write is what turns that race into a
//! detectable conflict instead of a lost update.

use async_trait::async_trait;
use thiserror::Error;

use mandate_state::{Mandate, MandateStatus};

/// Errors from the mandate repository.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    /// No mandate with the given id.
    #[error("mandate {id} not found")]
    NotFound {
        /// The missing id.
        id: i64,
    },

    /// The stored status no longer matches the caller's expectation —
    /// another writer got there first.
    #[error("mandate {id} was modified concurrently (expected status {expected})")]
    Conflict {
        /// The contested mandate.
        id: i64,
        /// The status the caller read before mutating.
        expected: MandateStatus,
    },

    /// The underlying store failed.
    #[error("mandate storage error: {0}")]
    Storage(String),
}

/// Persistent store of mandates.
#[async_trait]
pub trait MandateRepository: Send + Sync {
    /// Fetch a mandate by id.
    async fn get(&self, id: i64) -> Result<Mandate, RepoError>;

    /// Find the mandate correlated to a provider document key, if any.
    async fn find_by_document_key(&self, key: &str) -> Result<Option<Mandate>, RepoError>;

    /// Persist `mandate`, succeeding only if the stored status still equals
    /// `expected`. Fails with [`RepoError::Conflict`] otherwise.
    async fn update(&self, mandate: &Mandate, expected: MandateStatus) -> Result<(), RepoError>;
}
