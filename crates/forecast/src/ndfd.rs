//! NDFD digital-forecast snow extraction.
//!
//! The NDFD XML client returns a DWML time-series document. Snow amounts
//! live in a `<precipitation type="snow">` block whose `time-layout`
//! attribute references a `<time-layout>` block elsewhere in the document;
//! value i pairs with start-valid-time i of the matching layout.

use serde::Deserialize;
use time::{format_description::well_known::Rfc3339, Duration, OffsetDateTime};

use crate::round1;
use crate::source::{DigitalSnow, SourceError};

#[derive(Debug, Default, Deserialize)]
struct Dwml {
    #[serde(default)]
    data: DwmlData,
}

#[derive(Debug, Default, Deserialize)]
struct DwmlData {
    #[serde(rename = "time-layout", default)]
    time_layouts: Vec<TimeLayout>,
    #[serde(default)]
    parameters: Vec<ParameterBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct TimeLayout {
    #[serde(rename = "layout-key", default)]
    layout_key: String,
    #[serde(rename = "start-valid-time", default)]
    start_times: Vec<TextElement>,
}

#[derive(Debug, Default, Deserialize)]
struct ParameterBlock {
    #[serde(default)]
    precipitation: Vec<Precipitation>,
}

#[derive(Debug, Default, Deserialize)]
struct Precipitation {
    #[serde(rename = "type", default)]
    precip_type: String,
    #[serde(rename = "time-layout", default)]
    time_layout: String,
    #[serde(rename = "value", default)]
    values: Vec<TextElement>,
}

/// An element whose text content we want, tolerating attributes
/// (e.g. `<value xsi:nil="true"/>` or period-name annotations).
#[derive(Debug, Default, Deserialize)]
struct TextElement {
    #[serde(rename = "$value", default)]
    text: String,
}

/// Extract 24h/48h snow totals from a DWML document, measured from `now`.
///
/// Returns the unavailable value (both windows `None`) when the document
/// has no snow precipitation block, the block has no layout key, or no
/// time layout matches it: "source had nothing for us", not "zero snow".
/// The 48h medium window is NDFD-specific and intentionally differs from
/// the narrative pipeline's 72h.
pub fn snowfall_from_dwml(xml: &str, now: OffsetDateTime) -> Result<DigitalSnow, SourceError> {
    let dwml: Dwml = serde_xml_rs::from_str(xml)?;

    let snow = dwml
        .data
        .parameters
        .iter()
        .flat_map(|p| p.precipitation.iter())
        .find(|p| p.precip_type.eq_ignore_ascii_case("snow"));

    let Some(snow) = snow else {
        return Ok(DigitalSnow::unavailable());
    };
    if snow.time_layout.is_empty() {
        return Ok(DigitalSnow::unavailable());
    }

    let Some(layout) = dwml
        .data
        .time_layouts
        .iter()
        .find(|layout| layout.layout_key.trim() == snow.time_layout)
    else {
        return Ok(DigitalSnow::unavailable());
    };

    // Blank or non-numeric values (nil entries) count as zero.
    let values: Vec<f64> = snow
        .values
        .iter()
        .map(|v| v.text.trim().parse::<f64>().unwrap_or(0.0))
        .collect();
    let start_times: Vec<OffsetDateTime> = layout
        .start_times
        .iter()
        .filter_map(|s| OffsetDateTime::parse(s.text.trim(), &Rfc3339).ok())
        .collect();

    let h24 = now + Duration::hours(24);
    let h48 = now + Duration::hours(48);

    let mut sum_24 = 0.0;
    let mut sum_48 = 0.0;

    // zip stops at the shorter series; a length mismatch is tolerated.
    for (start, value) in start_times.iter().zip(values.iter()) {
        if *start <= now {
            continue;
        }
        if *start <= h24 {
            sum_24 += value;
        }
        if *start <= h48 {
            sum_48 += value;
        }
    }

    Ok(DigitalSnow {
        snow_24h: Some(round1(sum_24)),
        snow_48h: Some(round1(sum_48)),
    })
}
