//! HTTP client for the upstream NWS services.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::Deserialize;
use slog::{debug, Logger};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::ndfd::snowfall_from_dwml;
use crate::source::{DigitalSnow, ForecastPeriod, ForecastSource, GridPoint, SourceError};

pub const DEFAULT_API_BASE: &str = "https://api.weather.gov";
pub const DEFAULT_NDFD_BASE: &str =
    "https://digital.weather.gov/xml/sample_products/browser_interface/ndfdXMLclient.php";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Client for the api.weather.gov JSON API and the NDFD XML endpoint.
///
/// Sends an identifying User-Agent on every request per the upstream usage
/// policy, and retries transient failures with exponential backoff.
pub struct NwsClient {
    client: ClientWithMiddleware,
    api_base: String,
    ndfd_base: String,
    logger: Logger,
}

impl NwsClient {
    pub fn new(logger: Logger, user_agent: &str) -> Result<Self, SourceError> {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);
        let client = ClientBuilder::new(Client::builder().user_agent(user_agent).build()?)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(NwsClient {
            client,
            api_base: DEFAULT_API_BASE.to_string(),
            ndfd_base: DEFAULT_NDFD_BASE.to_string(),
            logger,
        })
    }

    /// Point the client at alternative endpoints (tests, proxies).
    pub fn with_base_urls(
        mut self,
        api_base: impl Into<String>,
        ndfd_base: impl Into<String>,
    ) -> Self {
        self.api_base = api_base.into();
        self.ndfd_base = ndfd_base.into();
        self
    }

    async fn get_text(&self, url: &str) -> Result<String, SourceError> {
        debug!(self.logger, "requesting: {}", url);
        let response = self
            .client
            .get(url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|source| SourceError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status,
            });
        }

        response.text().await.map_err(|source| SourceError::Body {
            url: url.to_string(),
            source,
        })
    }
}

#[derive(Debug, Deserialize)]
struct PointsResponse {
    properties: PointsProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PointsProperties {
    grid_id: String,
    grid_x: i64,
    grid_y: i64,
    forecast: Option<String>,
    forecast_hourly: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GridForecastResponse {
    properties: GridForecastProperties,
}

#[derive(Debug, Deserialize)]
struct GridForecastProperties {
    #[serde(default)]
    periods: Vec<RawPeriod>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPeriod {
    start_time: String,
    #[serde(default)]
    detailed_forecast: String,
}

#[async_trait]
impl ForecastSource for NwsClient {
    async fn resolve_grid(&self, lat: f64, lon: f64) -> Result<GridPoint, SourceError> {
        let url = format!("{}/points/{},{}", self.api_base, lat, lon);
        let body = self.get_text(&url).await?;
        let points: PointsResponse = serde_json::from_str(&body)?;

        Ok(GridPoint {
            grid_id: points.properties.grid_id,
            grid_x: points.properties.grid_x,
            grid_y: points.properties.grid_y,
            forecast_url: points.properties.forecast,
            forecast_hourly_url: points.properties.forecast_hourly,
        })
    }

    async fn narrative_periods(
        &self,
        grid: &GridPoint,
    ) -> Result<Vec<ForecastPeriod>, SourceError> {
        let url = format!(
            "{}/gridpoints/{}/{},{}/forecast",
            self.api_base, grid.grid_id, grid.grid_x, grid.grid_y
        );
        let body = self.get_text(&url).await?;
        let forecast: GridForecastResponse = serde_json::from_str(&body)?;

        let mut periods = Vec::with_capacity(forecast.properties.periods.len());
        for raw in forecast.properties.periods {
            match OffsetDateTime::parse(&raw.start_time, &Rfc3339) {
                Ok(start_time) => periods.push(ForecastPeriod {
                    start_time,
                    detailed_forecast: raw.detailed_forecast,
                }),
                Err(err) => {
                    debug!(
                        self.logger,
                        "skipping period with bad start time {}: {}", raw.start_time, err
                    );
                }
            }
        }
        Ok(periods)
    }

    async fn digital_snowfall(&self, lat: f64, lon: f64) -> Result<DigitalSnow, SourceError> {
        let url = format!(
            "{}?lat={}&lon={}&product=time-series&snow=snowamt&Unit=e",
            self.ndfd_base, lat, lon
        );
        let xml = self.get_text(&url).await?;
        snowfall_from_dwml(&xml, OffsetDateTime::now_utc())
    }
}
