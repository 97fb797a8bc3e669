//! Mandate persistence operations.
//!
//! All functions take a `&PgPool` and operate on the `mandates` table.
//! Lifecycle constraints are enforced at the application layer (via the
//! state machine in `mandate-state`); the conditional update here is the
//! storage-side arbiter for racing writers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use mandate_state::{Mandate, MandateStatus};

fn party_json(mandate: &Mandate) -> Result<serde_json::Value, sqlx::Error> {
    serde_json::to_value(&mandate.party).map_err(|e| {
        tracing::error!(id = mandate.id, error = %e, "failed to serialize mandate party");
        sqlx::Error::Encode(Box::new(e))
    })
}

fn property_json(mandate: &Mandate) -> Result<serde_json::Value, sqlx::Error> {
    serde_json::to_value(&mandate.property).map_err(|e| {
        tracing::error!(id = mandate.id, error = %e, "failed to serialize mandate property");
        sqlx::Error::Encode(Box::new(e))
    })
}

/// Insert a new mandate record.
pub async fn insert(pool: &PgPool, mandate: &Mandate) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO mandates (id, property_id, property, party, created_by,
            exclusivity_days, commission_percent, status, document_key, request_key,
            provider_status, artifact_url, artifact_filename, artifact_digest,
            created_at, updated_at, signed_at, expires_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)",
    )
    .bind(mandate.id)
    .bind(mandate.property.id)
    .bind(property_json(mandate)?)
    .bind(party_json(mandate)?)
    .bind(mandate.created_by)
    .bind(mandate.terms.exclusivity_days as i32)
    .bind(mandate.terms.commission_percent)
    .bind(mandate.status.as_str())
    .bind(&mandate.document_key)
    .bind(&mandate.request_key)
    .bind(&mandate.provider_status)
    .bind(&mandate.artifact_url)
    .bind(&mandate.artifact_filename)
    .bind(&mandate.artifact_digest)
    .bind(mandate.created_at)
    .bind(mandate.updated_at)
    .bind(mandate.signed_at)
    .bind(mandate.expires_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Persist a mandate, succeeding only if the stored status still equals
/// `expected`. Returns whether a row was updated — `false` means a
/// concurrent writer got there first.
pub async fn update_guarded(
    pool: &PgPool,
    mandate: &Mandate,
    expected: MandateStatus,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE mandates SET
            party = $1, property = $2, exclusivity_days = $3, commission_percent = $4,
            status = $5, document_key = $6, request_key = $7, provider_status = $8,
            artifact_url = $9, artifact_filename = $10, artifact_digest = $11,
            updated_at = $12, signed_at = $13, expires_at = $14
         WHERE id = $15 AND status = $16",
    )
    .bind(party_json(mandate)?)
    .bind(property_json(mandate)?)
    .bind(mandate.terms.exclusivity_days as i32)
    .bind(mandate.terms.commission_percent)
    .bind(mandate.status.as_str())
    .bind(&mandate.document_key)
    .bind(&mandate.request_key)
    .bind(&mandate.provider_status)
    .bind(&mandate.artifact_url)
    .bind(&mandate.artifact_filename)
    .bind(&mandate.artifact_digest)
    .bind(mandate.updated_at)
    .bind(mandate.signed_at)
    .bind(mandate.expires_at)
    .bind(mandate.id)
    .bind(expected.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a mandate by id.
pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM mandates WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Load all mandates, for startup hydration. Rows that no longer parse are
/// skipped with an error log rather than failing the boot — they indicate
/// data written by an incompatible version and need operator attention.
pub async fn load_all(pool: &PgPool) -> Result<Vec<Mandate>, sqlx::Error> {
    let rows = sqlx::query_as::<_, MandateRow>(
        "SELECT id, property, party, created_by, exclusivity_days, commission_percent,
                status, document_key, request_key, provider_status, artifact_url,
                artifact_filename, artifact_digest, created_at, updated_at, signed_at,
                expires_at
         FROM mandates ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let id = row.id;
            match row.into_mandate() {
                Ok(mandate) => Some(mandate),
                Err(e) => {
                    tracing::error!(
                        id,
                        error = %e,
                        "skipping mandate row that no longer parses — investigate"
                    );
                    None
                }
            }
        })
        .collect())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct MandateRow {
    id: i64,
    property: serde_json::Value,
    party: serde_json::Value,
    created_by: i64,
    exclusivity_days: i32,
    commission_percent: Decimal,
    status: String,
    document_key: Option<String>,
    request_key: Option<String>,
    provider_status: Option<String>,
    artifact_url: Option<String>,
    artifact_filename: Option<String>,
    artifact_digest: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    signed_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
}

impl MandateRow {
    fn into_mandate(self) -> Result<Mandate, String> {
        let status: MandateStatus = self.status.parse()?;
        let property = serde_json::from_value(self.property)
            .map_err(|e| format!("property column: {e}"))?;
        let party =
            serde_json::from_value(self.party).map_err(|e| format!("party column: {e}"))?;

        Ok(Mandate {
            id: self.id,
            property,
            party,
            created_by: self.created_by,
            terms: mandate_core::Terms {
                exclusivity_days: self.exclusivity_days.max(0) as u32,
                commission_percent: self.commission_percent,
            },
            status,
            document_key: self.document_key,
            request_key: self.request_key,
            provider_status: self.provider_status,
            artifact_url: self.artifact_url,
            artifact_filename: self.artifact_filename,
            artifact_digest: self.artifact_digest,
            created_at: self.created_at,
            updated_at: self.updated_at,
            signed_at: self.signed_at,
            expires_at: self.expires_at,
        })
    }
}
