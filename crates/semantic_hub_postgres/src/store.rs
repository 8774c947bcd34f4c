//! Postgres implementation of the `ModelStore` port.

use std::collections::BTreeSet;

use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::PgPool;

use semantic_hub_core::ports::{ModelStore, Result, WriteExpectation};
use semantic_hub_core::{HubError, ModelRecord, ModelUrn};

use crate::sqlx_types::PgModelRow;

const SCHEMA: &str = include_str!("../migrations/001_models.sql");

const SELECT_COLUMNS: &str = r#"
    SELECT urn, content, status, model_type, dependencies,
           created_at, updated_at, revision
    FROM semantic_hub_models
"#;

/// Postgres-backed model store. Writes are single statements guarded by
/// the row's `revision`, so a lost race affects zero rows.
pub struct PgModelStore {
    pool: PgPool,
}

impl PgModelStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the models table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(())
    }
}

const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

/// Transient faults are retryable `StoreUnavailable`; anything else is `Internal`.
pub(crate) fn store_error(e: sqlx::Error) -> HubError {
    let transient = match &e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => true,
        sqlx::Error::Database(db) => matches!(
            db.code().as_deref(),
            Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED)
        ),
        _ => false,
    };
    if transient {
        HubError::StoreUnavailable(e.to_string())
    } else {
        HubError::Internal(anyhow!(e))
    }
}

fn decode(row: PgModelRow) -> Result<ModelRecord> {
    row.try_into()
        .map_err(|e: String| HubError::Internal(anyhow!(e)))
}

fn revision_param(revision: u64) -> Result<i64> {
    i64::try_from(revision).map_err(|_| HubError::InvalidInput(format!("revision {revision} out of range")))
}

fn conflict(urn: &ModelUrn, detail: &str) -> HubError {
    HubError::StoreUnavailable(format!("concurrent modification of {urn}: {detail}"))
}

#[async_trait]
impl ModelStore for PgModelStore {
    async fn get(&self, urn: &ModelUrn) -> Result<Option<ModelRecord>> {
        let row = sqlx::query_as::<_, PgModelRow>(&format!("{SELECT_COLUMNS} WHERE urn = $1"))
            .bind(urn.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        row.map(decode).transpose()
    }

    async fn put(&self, record: &ModelRecord, expect: WriteExpectation) -> Result<()> {
        let dependencies: Vec<String> = record
            .dependencies
            .iter()
            .map(|d| d.as_str().to_string())
            .collect();

        let result = match expect {
            WriteExpectation::Absent => sqlx::query(
                r#"
                INSERT INTO semantic_hub_models (
                    urn, content, status, model_type, dependencies,
                    created_at, updated_at, revision
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (urn) DO NOTHING
                "#,
            )
            .bind(record.urn.as_str())
            .bind(&record.content)
            .bind(record.status.as_str())
            .bind(record.model_type.as_str())
            .bind(&dependencies)
            .bind(record.created_at)
            .bind(record.updated_at)
            .bind(revision_param(record.revision)?)
            .execute(&self.pool)
            .await
            .map_err(store_error)?,
            WriteExpectation::Revision(expected) => sqlx::query(
                r#"
                UPDATE semantic_hub_models
                SET content = $2,
                    status = $3,
                    model_type = $4,
                    dependencies = $5,
                    updated_at = $6,
                    revision = $7
                WHERE urn = $1
                  AND revision = $8
                "#,
            )
            .bind(record.urn.as_str())
            .bind(&record.content)
            .bind(record.status.as_str())
            .bind(record.model_type.as_str())
            .bind(&dependencies)
            .bind(record.updated_at)
            .bind(revision_param(record.revision)?)
            .bind(revision_param(expected)?)
            .execute(&self.pool)
            .await
            .map_err(store_error)?,
        };

        if result.rows_affected() == 0 {
            let detail = match expect {
                WriteExpectation::Absent => "record already exists".to_string(),
                WriteExpectation::Revision(n) => format!("revision {n} no longer current"),
            };
            return Err(conflict(&record.urn, &detail));
        }
        tracing::debug!(urn = %record.urn, revision = record.revision, "model row written");
        Ok(())
    }

    async fn delete(&self, urn: &ModelUrn, expected_revision: u64) -> Result<()> {
        let result = sqlx::query("DELETE FROM semantic_hub_models WHERE urn = $1 AND revision = $2")
            .bind(urn.as_str())
            .bind(revision_param(expected_revision)?)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        if result.rows_affected() == 0 {
            return Err(conflict(
                urn,
                &format!("revision {expected_revision} no longer current"),
            ));
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<ModelRecord>> {
        let rows = sqlx::query_as::<_, PgModelRow>(&format!("{SELECT_COLUMNS} ORDER BY urn"))
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;
        rows.into_iter().map(decode).collect()
    }

    async fn list_by_urns(&self, urns: &BTreeSet<ModelUrn>) -> Result<Vec<ModelRecord>> {
        if urns.is_empty() {
            return Ok(Vec::new());
        }
        let keys: Vec<String> = urns.iter().map(|u| u.as_str().to_string()).collect();
        let rows = sqlx::query_as::<_, PgModelRow>(&format!(
            "{SELECT_COLUMNS} WHERE urn = ANY($1) ORDER BY urn"
        ))
        .bind(&keys)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;
        rows.into_iter().map(decode).collect()
    }

    async fn list_by_package(&self, package_prefix: &str) -> Result<Vec<ModelRecord>> {
        let rows = sqlx::query_as::<_, PgModelRow>(&format!(
            "{SELECT_COLUMNS} WHERE starts_with(urn, $1) ORDER BY urn"
        ))
        .bind(package_prefix)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;
        rows.into_iter().map(decode).collect()
    }
}
