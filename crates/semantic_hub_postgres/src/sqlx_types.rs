//! Row types decoded straight from Postgres, converted into core types.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use semantic_hub_core::{ModelRecord, ModelStatus, ModelType, ModelUrn};

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PgModelRow {
    pub urn: String,
    pub content: String,
    pub status: String,
    pub model_type: String,
    pub dependencies: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub revision: i64,
}

impl TryFrom<PgModelRow> for ModelRecord {
    type Error = String;

    fn try_from(row: PgModelRow) -> Result<Self, Self::Error> {
        let urn = ModelUrn::parse(&row.urn).map_err(|e| e.to_string())?;
        let status = ModelStatus::parse(&row.status)
            .ok_or_else(|| format!("{urn}: unknown status '{}'", row.status))?;
        let model_type = ModelType::parse(&row.model_type)
            .ok_or_else(|| format!("{urn}: unknown model type '{}'", row.model_type))?;
        let dependencies = row
            .dependencies
            .iter()
            .map(|d| ModelUrn::parse(d).map_err(|e| e.to_string()))
            .collect::<Result<BTreeSet<_>, _>>()?;
        let revision = u64::try_from(row.revision)
            .map_err(|_| format!("{urn}: negative revision {}", row.revision))?;

        Ok(ModelRecord {
            urn,
            content: row.content,
            status,
            model_type,
            dependencies,
            created_at: row.created_at,
            updated_at: row.updated_at,
            revision,
        })
    }
}
