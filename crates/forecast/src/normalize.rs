//! Shaping reconciled totals into the stable public record.

use serde::{Deserialize, Serialize};
use snowline_core::Resort;
use time::OffsetDateTime;

use crate::reconcile::{Provenance, Reconciled};
use crate::source::GridPoint;

/// Links derived for a resort's forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastLinks {
    /// Public NWS map page for the resort's coordinates.
    pub nws_page: String,
    pub forecast: Option<String>,
    pub hourly: Option<String>,
}

/// The cached, publicly served forecast record: one per resort.
///
/// `snow_extended` is the medium-window total: 48h when the digital source
/// produced it, 72h from the narrative fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResortForecast {
    pub resort: Resort,
    pub grid: Option<GridPoint>,
    pub snow_24h: f64,
    pub snow_extended: f64,
    pub source: Option<Provenance>,
    pub links: ForecastLinks,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

fn nws_page(lat: f64, lon: f64) -> String {
    format!("https://forecast.weather.gov/MapClick.php?lat={lat}&lon={lon}")
}

/// Shape a reconciled result into the public record. Pure and infallible;
/// the refresh orchestrator stamps `updated_at` afterwards.
pub fn normalize(resort: &Resort, reconciled: Reconciled) -> ResortForecast {
    let links = ForecastLinks {
        nws_page: nws_page(resort.lat, resort.lon),
        forecast: reconciled.grid.forecast_url.clone(),
        hourly: reconciled.grid.forecast_hourly_url.clone(),
    };

    ResortForecast {
        resort: resort.clone(),
        grid: Some(reconciled.grid),
        snow_24h: reconciled.snow_24h,
        snow_extended: reconciled.snow_extended,
        source: Some(reconciled.provenance),
        links,
        updated_at: None,
    }
}

/// The zero-valued record served for a resort that has never been
/// refreshed: no grid, no provenance, `updated_at` null.
pub fn placeholder(resort: &Resort) -> ResortForecast {
    ResortForecast {
        resort: resort.clone(),
        grid: None,
        snow_24h: 0.0,
        snow_extended: 0.0,
        source: None,
        links: ForecastLinks {
            nws_page: nws_page(resort.lat, resort.lon),
            forecast: None,
            hourly: None,
        },
        updated_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snowline_core::Region;

    fn test_resort() -> Resort {
        Resort {
            id: "nubs-nob".to_string(),
            name: "Nub's Nob".to_string(),
            lat: 45.4697,
            lon: -84.9027,
            region: Region::NorthernLp,
        }
    }

    #[test]
    fn normalize_copies_grid_links_and_totals() {
        let resort = test_resort();
        let reconciled = Reconciled {
            grid: GridPoint {
                grid_id: "APX".to_string(),
                grid_x: 80,
                grid_y: 40,
                forecast_url: Some("https://api.weather.gov/gridpoints/APX/80,40/forecast".to_string()),
                forecast_hourly_url: None,
            },
            snow_24h: 1.5,
            snow_extended: 4.0,
            provenance: Provenance::Ndfd,
        };

        let record = normalize(&resort, reconciled);
        assert_eq!(record.snow_24h, 1.5);
        assert_eq!(record.snow_extended, 4.0);
        assert_eq!(record.source, Some(Provenance::Ndfd));
        assert_eq!(
            record.links.nws_page,
            "https://forecast.weather.gov/MapClick.php?lat=45.4697&lon=-84.9027"
        );
        assert_eq!(
            record.links.forecast.as_deref(),
            Some("https://api.weather.gov/gridpoints/APX/80,40/forecast")
        );
        assert_eq!(record.links.hourly, None);
        assert_eq!(record.updated_at, None);
    }

    #[test]
    fn placeholder_is_zero_valued_with_null_timestamp() {
        let record = placeholder(&test_resort());
        assert_eq!(record.snow_24h, 0.0);
        assert_eq!(record.snow_extended, 0.0);
        assert_eq!(record.source, None);
        assert_eq!(record.grid, None);
        assert_eq!(record.updated_at, None);
    }

    #[test]
    fn record_wire_shape() {
        let json = serde_json::to_value(placeholder(&test_resort())).unwrap();
        assert_eq!(json["snow24h"], 0.0);
        assert_eq!(json["snowExtended"], 0.0);
        assert!(json["updatedAt"].is_null());
        assert!(json["source"].is_null());
        assert!(json["links"]["nwsPage"].is_string());
    }
}
