//! The seam between the pipeline and the upstream weather services.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Grid metadata for a point, resolved through the NWS points lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridPoint {
    pub grid_id: String,
    pub grid_x: i64,
    pub grid_y: i64,
    pub forecast_url: Option<String>,
    pub forecast_hourly_url: Option<String>,
}

/// One narrative forecast period: a start instant and free-text description.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPeriod {
    pub start_time: OffsetDateTime,
    pub detailed_forecast: String,
}

/// Snow totals from the NDFD digital forecast.
///
/// `None` means the source had no applicable data, which is distinct from
/// `Some(0.0)` (data present, no snow). The distinction drives the
/// reconciler's fallback decision and must not be collapsed early.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DigitalSnow {
    pub snow_24h: Option<f64>,
    pub snow_48h: Option<f64>,
}

impl DigitalSnow {
    /// The "source unavailable" value: both windows absent.
    pub fn unavailable() -> Self {
        DigitalSnow {
            snow_24h: None,
            snow_48h: None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        self.snow_24h.is_none() && self.snow_48h.is_none()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest_middleware::Error,
    },
    #[error("{url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to decode response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to decode NDFD document: {0}")]
    Xml(#[from] serde_xml_rs::Error),
}

/// Upstream forecast data, by contract.
///
/// `resolve_grid` failures are fatal for a resort's reconciliation; the
/// other two calls have caller-decided fallback policies.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ForecastSource: Send + Sync {
    /// Map a latitude/longitude to the issuing office's grid coordinates
    /// and canonical forecast URLs.
    async fn resolve_grid(&self, lat: f64, lon: f64) -> Result<GridPoint, SourceError>;

    /// Fetch the ordered narrative forecast periods for a grid.
    async fn narrative_periods(
        &self,
        grid: &GridPoint,
    ) -> Result<Vec<ForecastPeriod>, SourceError>;

    /// Fetch NDFD snow-accumulation totals for a point.
    async fn digital_snowfall(&self, lat: f64, lon: f64) -> Result<DigitalSnow, SourceError>;
}
