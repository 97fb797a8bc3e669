//! # Repository Wiring
//!
//! Implements the engine's repository seam over the in-memory store with
//! Postgres write-through.
//!
//! Ordering on conditional updates: when a pool is present, the guarded
//! `UPDATE ... WHERE status = $expected` runs first — Postgres is the
//! arbiter of racing writers, and only the winner touches the in-memory
//! copy. Without a pool, the store's atomic `try_update` is the arbiter.

use async_trait::async_trait;
use sqlx::PgPool;

use mandate_engine::{MandateRepository, RepoError};
use mandate_state::{Mandate, MandateStatus};

use crate::db;
use crate::state::Store;

/// The engine's view of mandate persistence.
#[derive(Clone)]
pub struct AppRepository {
    mandates: Store<Mandate>,
    db: Option<PgPool>,
}

impl AppRepository {
    /// Wrap the runtime store and the optional durable mirror.
    pub fn new(mandates: Store<Mandate>, db: Option<PgPool>) -> Self {
        Self { mandates, db }
    }

    /// Insert a newly created mandate (durable mirror first).
    pub async fn insert(&self, mandate: &Mandate) -> Result<(), RepoError> {
        if let Some(pool) = &self.db {
            db::mandates::insert(pool, mandate)
                .await
                .map_err(|e| RepoError::Storage(e.to_string()))?;
        }
        self.mandates.insert(mandate.id, mandate.clone());
        Ok(())
    }

    /// Delete a mandate (durable mirror first).
    pub async fn delete(&self, id: i64) -> Result<(), RepoError> {
        if let Some(pool) = &self.db {
            db::mandates::delete(pool, id)
                .await
                .map_err(|e| RepoError::Storage(e.to_string()))?;
        }
        self.mandates
            .remove(id)
            .map(|_| ())
            .ok_or(RepoError::NotFound { id })
    }
}

#[async_trait]
impl MandateRepository for AppRepository {
    async fn get(&self, id: i64) -> Result<Mandate, RepoError> {
        self.mandates.get(id).ok_or(RepoError::NotFound { id })
    }

    async fn find_by_document_key(&self, key: &str) -> Result<Option<Mandate>, RepoError> {
        Ok(self
            .mandates
            .find(|m| m.document_key.as_deref() == Some(key)))
    }

    async fn update(&self, mandate: &Mandate, expected: MandateStatus) -> Result<(), RepoError> {
        if let Some(pool) = &self.db {
            let updated = db::mandates::update_guarded(pool, mandate, expected)
                .await
                .map_err(|e| RepoError::Storage(e.to_string()))?;
            if !updated {
                return Err(RepoError::Conflict {
                    id: mandate.id,
                    expected,
                });
            }
        }

        match self.mandates.try_update(mandate.id, |stored| {
            if stored.status == expected {
                *stored = mandate.clone();
                Ok(())
            } else {
                Err(())
            }
        }) {
            Some(Ok(())) => Ok(()),
            Some(Err(())) => Err(RepoError::Conflict {
                id: mandate.id,
                expected,
            }),
            None => Err(RepoError::NotFound { id: mandate.id }),
        }
    }
}
