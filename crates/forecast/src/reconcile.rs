//! Reconciliation of the two snow-forecast sources for one resort.

use std::fmt;

use serde::{Deserialize, Serialize};
use slog::{info, Logger};
use snowline_core::Resort;
use time::OffsetDateTime;

use crate::narrative::sum_periods;
use crate::source::{DigitalSnow, ForecastSource, GridPoint, SourceError};

/// Which pipeline produced a cached total.
///
/// The fallback tag names the preferred source's failure rather than the
/// fallback's identity; the wire value is part of the public contract and
/// is preserved as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    #[serde(rename = "ndfd")]
    Ndfd,
    #[serde(rename = "ndfd-failed")]
    NdfdFailed,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Ndfd => f.write_str("ndfd"),
            Provenance::NdfdFailed => f.write_str("ndfd-failed"),
        }
    }
}

/// A resort's reconciled snow totals, before normalization.
///
/// `snow_extended` covers 48h when the digital source won and 72h from the
/// narrative fallback; the two windows are deliberately not unified.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub grid: GridPoint,
    pub snow_24h: f64,
    pub snow_extended: f64,
    pub provenance: Provenance,
}

/// Resolve the grid for a resort, then pick a snow source.
///
/// The grid lookup is a hard dependency: its failure aborts the whole
/// reconciliation. The NDFD source is preferred whenever it yields at
/// least one concrete total (a missing side counts as zero); any NDFD
/// error or a fully unavailable result falls back to summing the grid's
/// narrative forecast periods.
pub async fn reconcile(
    source: &dyn ForecastSource,
    resort: &Resort,
    now: OffsetDateTime,
    logger: &Logger,
) -> Result<Reconciled, SourceError> {
    let grid = source.resolve_grid(resort.lat, resort.lon).await?;

    let digital = match source.digital_snowfall(resort.lat, resort.lon).await {
        Ok(digital) => digital,
        Err(err) => {
            info!(logger, "ndfd fetch failed for {}: {}", resort.id, err);
            DigitalSnow::unavailable()
        }
    };

    if !digital.is_unavailable() {
        return Ok(Reconciled {
            grid,
            snow_24h: digital.snow_24h.unwrap_or(0.0),
            snow_extended: digital.snow_48h.unwrap_or(0.0),
            provenance: Provenance::Ndfd,
        });
    }

    info!(logger, "falling back to narrative forecast for {}", resort.id);
    let periods = source.narrative_periods(&grid).await?;
    let totals = sum_periods(&periods, now);

    Ok(Reconciled {
        grid,
        snow_24h: totals.snow_24h,
        snow_extended: totals.snow_72h,
        provenance: Provenance::NdfdFailed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ForecastPeriod, MockForecastSource};
    use snowline_core::Region;
    use time::macros::datetime;

    fn test_logger() -> Logger {
        Logger::root(slog::Discard, slog::o!())
    }

    fn test_resort() -> Resort {
        Resort {
            id: "boyne-mountain".to_string(),
            name: "Boyne Mountain".to_string(),
            lat: 45.1637,
            lon: -84.9299,
            region: Region::NorthernLp,
        }
    }

    fn test_grid() -> GridPoint {
        GridPoint {
            grid_id: "APX".to_string(),
            grid_x: 73,
            grid_y: 32,
            forecast_url: Some("https://api.weather.gov/gridpoints/APX/73,32/forecast".to_string()),
            forecast_hourly_url: None,
        }
    }

    #[tokio::test]
    async fn grid_failure_aborts_reconciliation() {
        let mut source = MockForecastSource::new();
        source.expect_resolve_grid().returning(|_, _| {
            Err(SourceError::Status {
                url: "https://api.weather.gov/points/45.1637,-84.9299".to_string(),
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            })
        });
        source.expect_digital_snowfall().never();
        source.expect_narrative_periods().never();

        let result = reconcile(&source, &test_resort(), datetime!(2025-01-10 12:00 UTC), &test_logger()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn digital_source_preferred_when_available() {
        let mut source = MockForecastSource::new();
        source.expect_resolve_grid().returning(|_, _| Ok(test_grid()));
        source.expect_digital_snowfall().returning(|_, _| {
            Ok(DigitalSnow {
                snow_24h: Some(2.5),
                snow_48h: Some(6.0),
            })
        });
        // The narrative pipeline is never consulted, even though it might
        // have produced a different total.
        source.expect_narrative_periods().never();

        let reconciled = reconcile(
            &source,
            &test_resort(),
            datetime!(2025-01-10 12:00 UTC),
            &test_logger(),
        )
        .await
        .unwrap();

        assert_eq!(reconciled.snow_24h, 2.5);
        assert_eq!(reconciled.snow_extended, 6.0);
        assert_eq!(reconciled.provenance, Provenance::Ndfd);
    }

    #[tokio::test]
    async fn partial_digital_result_still_wins_with_zero_substituted() {
        let mut source = MockForecastSource::new();
        source.expect_resolve_grid().returning(|_, _| Ok(test_grid()));
        source.expect_digital_snowfall().returning(|_, _| {
            Ok(DigitalSnow {
                snow_24h: Some(1.0),
                snow_48h: None,
            })
        });
        source.expect_narrative_periods().never();

        let reconciled = reconcile(
            &source,
            &test_resort(),
            datetime!(2025-01-10 12:00 UTC),
            &test_logger(),
        )
        .await
        .unwrap();

        assert_eq!(reconciled.snow_24h, 1.0);
        assert_eq!(reconciled.snow_extended, 0.0);
        assert_eq!(reconciled.provenance, Provenance::Ndfd);
    }

    #[tokio::test]
    async fn unavailable_digital_falls_back_to_narrative() {
        let now = datetime!(2025-01-10 12:00 UTC);
        let mut source = MockForecastSource::new();
        source.expect_resolve_grid().returning(|_, _| Ok(test_grid()));
        source
            .expect_digital_snowfall()
            .returning(|_, _| Ok(DigitalSnow::unavailable()));
        source.expect_narrative_periods().returning(move |_| {
            Ok(vec![ForecastPeriod {
                start_time: now + time::Duration::hours(2),
                detailed_forecast: "New snow accumulation of 3 to 5 inches possible.".to_string(),
            }])
        });

        let reconciled = reconcile(&source, &test_resort(), now, &test_logger())
            .await
            .unwrap();

        assert_eq!(reconciled.snow_24h, 4.0);
        assert_eq!(reconciled.snow_extended, 4.0);
        assert_eq!(reconciled.provenance, Provenance::NdfdFailed);
    }

    #[tokio::test]
    async fn digital_fetch_error_falls_back_to_narrative() {
        let now = datetime!(2025-01-10 12:00 UTC);
        let mut source = MockForecastSource::new();
        source.expect_resolve_grid().returning(|_, _| Ok(test_grid()));
        source.expect_digital_snowfall().returning(|_, _| {
            Err(SourceError::Status {
                url: "https://digital.weather.gov/...".to_string(),
                status: reqwest::StatusCode::BAD_GATEWAY,
            })
        });
        source
            .expect_narrative_periods()
            .returning(|_| Ok(Vec::new()));

        let reconciled = reconcile(&source, &test_resort(), now, &test_logger())
            .await
            .unwrap();

        assert_eq!(reconciled.snow_24h, 0.0);
        assert_eq!(reconciled.snow_extended, 0.0);
        assert_eq!(reconciled.provenance, Provenance::NdfdFailed);
    }

    #[test]
    fn provenance_wire_tags() {
        assert_eq!(
            serde_json::to_string(&Provenance::Ndfd).unwrap(),
            r#""ndfd""#
        );
        assert_eq!(
            serde_json::to_string(&Provenance::NdfdFailed).unwrap(),
            r#""ndfd-failed""#
        );
    }
}
