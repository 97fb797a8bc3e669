//! # Database Layer
//!
//! Optional Postgres persistence. The pool is created from `DATABASE_URL`;
//! when the variable is unset the application runs in-memory only, which
//! is the development default.

pub mod mandates;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Schema applied at startup. The partial unique index enforces the
/// one-in-flight-mandate-per-property rule at the storage layer, so a race
/// the application-level check misses fails loudly here.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS mandates (
    id                 BIGINT PRIMARY KEY,
    property_id        BIGINT NOT NULL,
    property           JSONB NOT NULL,
    party              JSONB NOT NULL,
    created_by         BIGINT NOT NULL,
    exclusivity_days   INTEGER NOT NULL,
    commission_percent NUMERIC(5, 2) NOT NULL,
    status             TEXT NOT NULL,
    document_key       TEXT,
    request_key        TEXT,
    provider_status    TEXT,
    artifact_url       TEXT,
    artifact_filename  TEXT,
    artifact_digest    TEXT,
    created_at         TIMESTAMPTZ NOT NULL,
    updated_at         TIMESTAMPTZ NOT NULL,
    signed_at          TIMESTAMPTZ,
    expires_at         TIMESTAMPTZ
);

CREATE UNIQUE INDEX IF NOT EXISTS mandates_one_in_flight_per_property
    ON mandates (property_id) WHERE status = 'awaiting_signature';

CREATE INDEX IF NOT EXISTS mandates_document_key
    ON mandates (document_key) WHERE document_key IS NOT NULL;
"#;

/// Create the connection pool and apply the schema.
///
/// Returns `Ok(None)` when `DATABASE_URL` is unset — in-memory only mode.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        tracing::warn!("DATABASE_URL not set — running without durable storage");
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&url)
        .await?;

    for statement in SCHEMA.split(';').filter(|s| !s.trim().is_empty()) {
        sqlx::query(statement).execute(&pool).await?;
    }

    tracing::info!("database pool initialized");
    Ok(Some(pool))
}
