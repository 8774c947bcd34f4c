use std::time::Duration;

use semantic_hub_core::HubError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::store::store_error;

pub const DATABASE_URL_ENV: &str = "SEMANTIC_HUB_DATABASE_URL";
pub const MAX_CONNECTIONS_ENV: &str = "SEMANTIC_HUB_DB_MAX_CONNECTIONS";

/// Connection settings for `PgModelStore`.
#[derive(Debug, Clone)]
pub struct PgStoreConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PgStoreConfig {
    fn default() -> Self {
        Self {
            database_url: "postgresql://localhost:5432/semantic_hub".to_string(),
            max_connections: 10,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

impl PgStoreConfig {
    pub fn from_env() -> Result<Self, HubError> {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            config.database_url = url;
        }
        if let Ok(raw) = std::env::var(MAX_CONNECTIONS_ENV) {
            config.max_connections = raw.trim().parse().map_err(|_| {
                HubError::InvalidInput(format!("{MAX_CONNECTIONS_ENV}: cannot parse '{raw}'"))
            })?;
        }
        Ok(config)
    }

    pub async fn connect(&self) -> Result<PgPool, HubError> {
        info!(
            "Connecting to database: {}",
            mask_database_url(&self.database_url)
        );
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
            .connect(&self.database_url)
            .await
            .map_err(|e| {
                warn!("Failed to connect to database: {}", e);
                store_error(e)
            })
    }
}

/// Mask the password of a database URL for logging.
fn mask_database_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("***"));
            }
            parsed.to_string()
        }
        // Not a URL (e.g. a libpq keyword string): keep only the head
        Err(_) => match raw.get(..10) {
            Some(head) if raw.len() > 20 => format!("{head}***"),
            _ => "***".to_string(),
        },
    }
}
