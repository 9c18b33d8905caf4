//! Cached forecast records: one per resort, overwritten wholesale.
//!
//! Records have no TTL; a stale record stays valid until the next regional
//! refresh overwrites it. The serving path only ever reads.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use tokio::sync::RwLock;

use crate::normalize::ResortForecast;

#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("failed to encode cached forecast: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to format timestamp: {0}")]
    TimeFormat(#[from] time::error::Format),
    #[error("failed to create cache directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Storage for cached forecast records, keyed by resort id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ForecastCache: Send + Sync {
    async fn get(&self, resort_id: &str) -> Result<Option<ResortForecast>, CacheError>;

    /// Last-write-wins overwrite of the resort's record.
    async fn put(&self, record: &ResortForecast) -> Result<(), CacheError>;
}

/// SQLite-backed cache; the record body is stored as a JSON payload.
pub struct SqliteCache {
    pool: SqlitePool,
}

impl SqliteCache {
    pub async fn new(path: &str) -> Result<Self, CacheError> {
        if let Some(parent) = Path::new(path).parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| CacheError::CreateDir {
                    path: parent.display().to_string(),
                    source,
                })?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .pragma("journal_mode", "WAL")
            .pragma("synchronous", "NORMAL")
            .pragma("busy_timeout", "5000");

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(SqliteCache { pool })
    }
}

#[async_trait]
impl ForecastCache for SqliteCache {
    async fn get(&self, resort_id: &str) -> Result<Option<ResortForecast>, CacheError> {
        let row = sqlx::query("SELECT payload FROM forecasts WHERE resort_id = ?1")
            .bind(resort_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let payload: String = row.get("payload");
                Ok(Some(serde_json::from_str(&payload)?))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, record: &ResortForecast) -> Result<(), CacheError> {
        let payload = serde_json::to_string(record)?;
        let updated_at = match record.updated_at {
            Some(ts) => Some(ts.format(&Rfc3339)?),
            None => None,
        };

        sqlx::query(
            "INSERT INTO forecasts (resort_id, payload, updated_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(resort_id) DO UPDATE SET payload = excluded.payload, \
             updated_at = excluded.updated_at",
        )
        .bind(&record.resort.id)
        .bind(payload)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// In-memory cache for tests and embedders.
#[derive(Default)]
pub struct MemoryCache {
    records: RwLock<HashMap<String, ResortForecast>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ForecastCache for MemoryCache {
    async fn get(&self, resort_id: &str) -> Result<Option<ResortForecast>, CacheError> {
        Ok(self.records.read().await.get(resort_id).cloned())
    }

    async fn put(&self, record: &ResortForecast) -> Result<(), CacheError> {
        self.records
            .write()
            .await
            .insert(record.resort.id.clone(), record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::placeholder;
    use snowline_core::{Region, Resort};
    use time::macros::datetime;

    fn test_record(id: &str) -> ResortForecast {
        let resort = Resort {
            id: id.to_string(),
            name: "Test Hill".to_string(),
            lat: 45.0,
            lon: -85.0,
            region: Region::NorthernLp,
        };
        placeholder(&resort)
    }

    #[tokio::test]
    async fn sqlite_round_trip_and_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("forecasts.sqlite");
        let cache = SqliteCache::new(&db_path.display().to_string()).await.unwrap();

        assert!(cache.get("test-hill").await.unwrap().is_none());

        let mut record = test_record("test-hill");
        record.snow_24h = 2.0;
        cache.put(&record).await.unwrap();
        let loaded = cache.get("test-hill").await.unwrap().unwrap();
        assert_eq!(loaded.snow_24h, 2.0);
        assert_eq!(loaded.updated_at, None);

        record.snow_24h = 5.5;
        record.updated_at = Some(datetime!(2025-01-10 09:00 UTC));
        cache.put(&record).await.unwrap();
        let loaded = cache.get("test-hill").await.unwrap().unwrap();
        assert_eq!(loaded.snow_24h, 5.5);
        assert_eq!(loaded.updated_at, Some(datetime!(2025-01-10 09:00 UTC)));
    }

    #[tokio::test]
    async fn memory_cache_round_trip() {
        let cache = MemoryCache::new();
        assert!(cache.get("test-hill").await.unwrap().is_none());

        let record = test_record("test-hill");
        cache.put(&record).await.unwrap();
        assert_eq!(cache.get("test-hill").await.unwrap(), Some(record));
    }
}
