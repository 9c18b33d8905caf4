//! Region-scoped refresh and the cache-only read path.

use std::collections::BTreeMap;

use slog::{error, info, Logger};
use snowline_core::{Region, Resort, ResortTable};
use time::OffsetDateTime;

use crate::cache::{CacheError, ForecastCache};
use crate::normalize::{normalize, placeholder, ResortForecast};
use crate::reconcile::reconcile;
use crate::source::{ForecastSource, SourceError};

#[derive(thiserror::Error, Debug)]
pub enum RefreshError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Outcome counts for one region refresh run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshSummary {
    pub refreshed: usize,
    pub failed: usize,
}

/// Refresh every resort in a region, sequentially.
///
/// Each resort's failure is logged and skipped: its existing cache record
/// is left untouched (stale-but-present beats missing) and the remaining
/// resorts still run. Successful records overwrite the cache
/// unconditionally, stamped with the refresh time.
pub async fn refresh_region(
    region: Region,
    table: &ResortTable,
    source: &dyn ForecastSource,
    cache: &dyn ForecastCache,
    logger: &Logger,
) -> RefreshSummary {
    info!(logger, "refreshing forecasts for region {}", region);

    let mut summary = RefreshSummary::default();
    for resort in table.by_region(region) {
        match refresh_resort(resort, source, cache, logger).await {
            Ok(()) => {
                info!(logger, "updated forecast for {}", resort.id);
                summary.refreshed += 1;
            }
            Err(err) => {
                error!(logger, "failed to refresh {}: {}", resort.id, err);
                summary.failed += 1;
            }
        }
    }

    info!(
        logger,
        "region {} done: {} updated, {} failed", region, summary.refreshed, summary.failed
    );
    summary
}

async fn refresh_resort(
    resort: &Resort,
    source: &dyn ForecastSource,
    cache: &dyn ForecastCache,
    logger: &Logger,
) -> Result<(), RefreshError> {
    let now = OffsetDateTime::now_utc();
    let reconciled = reconcile(source, resort, now, logger).await?;
    let mut record = normalize(resort, reconciled);
    record.updated_at = Some(now);
    cache.put(&record).await?;
    Ok(())
}

/// Read one resort's cached record, substituting the zero-valued
/// placeholder when the resort has never been refreshed. Never calls
/// upstream; a cache read error also degrades to the placeholder.
pub async fn read_one(
    resort: &Resort,
    cache: &dyn ForecastCache,
    logger: &Logger,
) -> ResortForecast {
    match cache.get(&resort.id).await {
        Ok(Some(record)) => record,
        Ok(None) => placeholder(resort),
        Err(err) => {
            error!(logger, "cache read failed for {}: {}", resort.id, err);
            placeholder(resort)
        }
    }
}

/// The full cache snapshot across every known resort, keyed by resort id.
/// Always succeeds.
pub async fn read_all(
    table: &ResortTable,
    cache: &dyn ForecastCache,
    logger: &Logger,
) -> BTreeMap<String, ResortForecast> {
    let mut all = BTreeMap::new();
    for resort in table.iter() {
        all.insert(resort.id.clone(), read_one(resort, cache, logger).await);
    }
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::source::{DigitalSnow, GridPoint, MockForecastSource};

    fn test_logger() -> Logger {
        Logger::root(slog::Discard, slog::o!())
    }

    fn resort(id: &str, lat: f64) -> Resort {
        Resort {
            id: id.to_string(),
            name: id.to_string(),
            lat,
            lon: -85.0,
            region: Region::NorthernLp,
        }
    }

    fn test_table() -> ResortTable {
        ResortTable::new(vec![
            resort("first", 45.0),
            resort("second", 46.0),
            resort("third", 47.0),
        ])
    }

    fn grid_for(lat: f64) -> GridPoint {
        GridPoint {
            grid_id: "APX".to_string(),
            grid_x: lat as i64,
            grid_y: 10,
            forecast_url: None,
            forecast_hourly_url: None,
        }
    }

    /// Source where the grid lookup fails for lat 46.0 ("second") and the
    /// digital pipeline answers for everyone else.
    fn failing_second_source() -> MockForecastSource {
        let mut source = MockForecastSource::new();
        source.expect_resolve_grid().returning(|lat, _| {
            if lat == 46.0 {
                Err(SourceError::Status {
                    url: "https://api.weather.gov/points/46,-85".to_string(),
                    status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                })
            } else {
                Ok(grid_for(lat))
            }
        });
        source.expect_digital_snowfall().returning(|lat, _| {
            Ok(DigitalSnow {
                snow_24h: Some(lat - 44.0),
                snow_48h: Some(lat - 43.0),
            })
        });
        source
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_siblings() {
        let table = test_table();
        let cache = MemoryCache::new();
        let source = failing_second_source();

        let summary =
            refresh_region(Region::NorthernLp, &table, &source, &cache, &test_logger()).await;
        assert_eq!(summary.refreshed, 2);
        assert_eq!(summary.failed, 1);

        assert!(cache.get("first").await.unwrap().is_some());
        assert!(cache.get("second").await.unwrap().is_none());
        assert!(cache.get("third").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn failure_leaves_prior_record_untouched() {
        let table = test_table();
        let cache = MemoryCache::new();

        let mut stale = placeholder(&resort("second", 46.0));
        stale.snow_24h = 9.0;
        cache.put(&stale).await.unwrap();

        let source = failing_second_source();
        refresh_region(Region::NorthernLp, &table, &source, &cache, &test_logger()).await;

        let kept = cache.get("second").await.unwrap().unwrap();
        assert_eq!(kept.snow_24h, 9.0);
    }

    #[tokio::test]
    async fn rerunning_refresh_is_idempotent_on_totals() {
        let table = test_table();
        let cache = MemoryCache::new();
        let source = failing_second_source();

        refresh_region(Region::NorthernLp, &table, &source, &cache, &test_logger()).await;
        let first_run = cache.get("first").await.unwrap().unwrap();

        refresh_region(Region::NorthernLp, &table, &source, &cache, &test_logger()).await;
        let second_run = cache.get("first").await.unwrap().unwrap();

        assert_eq!(first_run.snow_24h, second_run.snow_24h);
        assert_eq!(first_run.snow_extended, second_run.snow_extended);
        assert_eq!(first_run.source, second_run.source);
    }

    #[tokio::test]
    async fn refresh_stamps_updated_at() {
        let table = ResortTable::new(vec![resort("first", 45.0)]);
        let cache = MemoryCache::new();
        let source = failing_second_source();

        refresh_region(Region::NorthernLp, &table, &source, &cache, &test_logger()).await;
        let record = cache.get("first").await.unwrap().unwrap();
        assert!(record.updated_at.is_some());
        assert_eq!(record.snow_24h, 1.0);
        assert_eq!(record.snow_extended, 2.0);
    }

    #[tokio::test]
    async fn read_all_substitutes_placeholders() {
        let table = test_table();
        let cache = MemoryCache::new();

        let mut cached = placeholder(&resort("first", 45.0));
        cached.snow_24h = 3.0;
        cache.put(&cached).await.unwrap();

        let all = read_all(&table, &cache, &test_logger()).await;
        assert_eq!(all.len(), 3);
        assert_eq!(all["first"].snow_24h, 3.0);
        assert_eq!(all["second"].snow_24h, 0.0);
        assert_eq!(all["second"].updated_at, None);
        assert_eq!(all["third"].snow_extended, 0.0);
    }

    #[tokio::test]
    async fn read_one_never_fails() {
        let cache = MemoryCache::new();
        let record = read_one(&resort("unknown", 45.0), &cache, &test_logger()).await;
        assert_eq!(record.snow_24h, 0.0);
        assert_eq!(record.updated_at, None);
    }
}
