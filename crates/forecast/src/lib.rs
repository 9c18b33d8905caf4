//! Snowline forecast pipeline.
//!
//! Fetches raw NWS/NDFD data for the monitored resorts, extracts snowfall
//! totals over the rolling look-ahead windows, reconciles the two upstream
//! sources, and caches one normalized record per resort. Consumers read the
//! cache only; refreshes happen on the daemon's schedule.

mod cache;
mod narrative;
mod ndfd;
mod normalize;
mod nws;
mod reconcile;
mod refresh;
mod source;

pub use cache::{CacheError, ForecastCache, MemoryCache, SqliteCache};
pub use narrative::{snow_inches, sum_periods, SnowTotals};
pub use ndfd::snowfall_from_dwml;
pub use normalize::{normalize, placeholder, ForecastLinks, ResortForecast};
pub use nws::{NwsClient, DEFAULT_API_BASE, DEFAULT_NDFD_BASE};
pub use reconcile::{reconcile, Provenance, Reconciled};
pub use refresh::{read_all, read_one, refresh_region, RefreshError, RefreshSummary};
pub use source::{DigitalSnow, ForecastPeriod, ForecastSource, GridPoint, SourceError};

/// Round a snowfall total to one decimal place of inches.
pub(crate) fn round1(inches: f64) -> f64 {
    (inches * 10.0).round() / 10.0
}
