//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers via
//! the `State` extractor.
//!
//! The in-memory [`Store`] is the authoritative runtime copy of mandates;
//! an optional Postgres pool is written through on every mutation and
//! hydrated at startup. Signing (controller + reconciler) is optional: when
//! the Clicksign credentials are absent, the submit and webhook endpoints
//! answer 503 while CRUD keeps working.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use sqlx::PgPool;

use mandate_artifact::FsArtifactStore;
use mandate_clicksign::ClicksignClient;
use mandate_engine::{LifecycleController, WebhookReconciler};
use mandate_state::Mandate;

use crate::auth::SecretToken;
use crate::repo::AppRepository;

/// Controller wired to the production seams.
pub type AppController = LifecycleController<AppRepository, ClicksignClient, FsArtifactStore>;
/// Reconciler wired to the production seams.
pub type AppReconciler = WebhookReconciler<AppRepository, ClicksignClient, FsArtifactStore>;

// ── Generic in-memory store ──────────────────────────────────────────

/// Thread-safe, cloneable in-memory key-value store.
///
/// All operations are synchronous (the RwLock is `parking_lot`, not
/// `tokio::sync`) because the lock is never held across `.await` points.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<i64, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: i64, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    /// Retrieve a record by id.
    pub fn get(&self, id: i64) -> Option<T> {
        self.data.read().get(&id).cloned()
    }

    /// List all records.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// First record matching a predicate.
    pub fn find(&self, mut pred: impl FnMut(&T) -> bool) -> Option<T> {
        self.data.read().values().find(|v| pred(v)).cloned()
    }

    /// Atomically read-validate-update a record.
    ///
    /// The closure may inspect the current state, validate preconditions,
    /// mutate the record, and return `Ok(R)` or `Err(E)`. The whole
    /// operation runs under one write lock, eliminating TOCTOU races
    /// between read and update.
    ///
    /// Returns `None` if the record doesn't exist.
    pub fn try_update<R, E>(
        &self,
        id: i64,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(&id).map(f)
    }

    /// Remove a record by id.
    pub fn remove(&self, id: i64) -> Option<T> {
        self.data.write().remove(&id)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ── Configuration ────────────────────────────────────────────────────

/// Application configuration assembled in `main`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Listen port.
    pub port: u16,
    /// Static bearer token; `None` disables authentication.
    pub auth_token: Option<SecretToken>,
    /// Directory for generated contract artifacts.
    pub artifact_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
            artifact_dir: PathBuf::from("artifacts"),
        }
    }
}

// ── AppState ─────────────────────────────────────────────────────────

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Authoritative runtime copy of all mandates.
    pub mandates: Store<Mandate>,
    /// Durable mirror, written through on mutation.
    pub db: Option<PgPool>,
    /// Application configuration.
    pub config: AppConfig,
    /// Next mandate id to assign.
    next_id: Arc<AtomicI64>,
    /// Webhook reconciler (which owns the lifecycle controller), present
    /// when Clicksign credentials are configured.
    signing: Option<Arc<AppReconciler>>,
}

impl AppState {
    /// Build state with no database and no signing — CRUD only.
    pub fn new(config: AppConfig) -> Self {
        Self {
            mandates: Store::new(),
            db: None,
            config,
            next_id: Arc::new(AtomicI64::new(1)),
            signing: None,
        }
    }

    /// Attach the database pool.
    pub fn with_db(mut self, db: PgPool) -> Self {
        self.db = Some(db);
        self
    }

    /// Attach the webhook reconciler (and, through it, the controller).
    pub fn with_signing(mut self, reconciler: AppReconciler) -> Self {
        self.signing = Some(Arc::new(reconciler));
        self
    }

    /// The repository view over this state, as the engine consumes it.
    pub fn repository(&self) -> AppRepository {
        AppRepository::new(self.mandates.clone(), self.db.clone())
    }

    /// The reconciler, when signing is configured.
    pub fn signing(&self) -> Option<&Arc<AppReconciler>> {
        self.signing.as_ref()
    }

    /// The lifecycle controller, when signing is configured.
    pub fn controller(&self) -> Option<&AppController> {
        self.signing.as_ref().map(|r| r.controller())
    }

    /// Allocate the next mandate id.
    pub fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Load all mandates from the database into the in-memory store and
    /// advance the id sequence past them. No-op without a pool.
    pub async fn hydrate_from_db(&self) -> Result<(), sqlx::Error> {
        let Some(pool) = &self.db else {
            return Ok(());
        };
        let mandates = crate::db::mandates::load_all(pool).await?;
        let mut max_id = 0;
        let count = mandates.len();
        for mandate in mandates {
            max_id = max_id.max(mandate.id);
            self.mandates.insert(mandate.id, mandate);
        }
        self.next_id.store(max_id + 1, Ordering::SeqCst);
        tracing::info!(count, "hydrated mandates from database");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_insert_get_remove() {
        let store: Store<String> = Store::new();
        assert!(store.is_empty());
        assert!(store.insert(1, "a".to_string()).is_none());
        assert_eq!(store.get(1).as_deref(), Some("a"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.remove(1).as_deref(), Some("a"));
        assert!(store.get(1).is_none());
    }

    #[test]
    fn store_try_update_validates_under_one_lock() {
        let store: Store<i32> = Store::new();
        store.insert(1, 10);

        let ok: Option<Result<i32, &str>> = store.try_update(1, |v| {
            *v += 1;
            Ok(*v)
        });
        assert_eq!(ok, Some(Ok(11)));

        let rejected: Option<Result<(), &str>> = store.try_update(1, |v| {
            if *v > 10 {
                Err("too big")
            } else {
                Ok(())
            }
        });
        assert_eq!(rejected, Some(Err("too big")));

        let missing: Option<Result<(), &str>> = store.try_update(99, |_| Ok(()));
        assert!(missing.is_none());
    }

    #[test]
    fn store_find_scans_values() {
        let store: Store<i32> = Store::new();
        store.insert(1, 10);
        store.insert(2, 20);
        assert_eq!(store.find(|v| *v > 15), Some(20));
        assert!(store.find(|v| *v > 25).is_none());
    }

    #[test]
    fn id_allocation_is_monotonic() {
        let state = AppState::new(AppConfig::default());
        let a = state.allocate_id();
        let b = state.allocate_id();
        assert!(b > a);
    }
}
