//! Monitored resort reference data.
//!
//! The resort list and its region grouping are immutable reference data:
//! loaded once at startup (built-in defaults or a `resorts.toml` override)
//! and passed explicitly into the refresh and read paths. Nothing mutates
//! the table at runtime.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{load_config, ConfigSource};

/// The four fixed forecast regions, refreshed on a staggered daily schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Region {
    WesternUp,
    EasternUp,
    NorthernLp,
    SouthernLp,
}

impl Region {
    /// All regions, in refresh-schedule order.
    pub fn all() -> [Region; 4] {
        [
            Region::WesternUp,
            Region::EasternUp,
            Region::NorthernLp,
            Region::SouthernLp,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::WesternUp => "western-up",
            Region::EasternUp => "eastern-up",
            Region::NorthernLp => "northern-lp",
            Region::SouthernLp => "southern-lp",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRegionError(pub String);

impl fmt::Display for ParseRegionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown region: {}", self.0)
    }
}

impl std::error::Error for ParseRegionError {}

impl FromStr for Region {
    type Err = ParseRegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "western-up" => Ok(Region::WesternUp),
            "eastern-up" => Ok(Region::EasternUp),
            "northern-lp" => Ok(Region::NorthernLp),
            "southern-lp" => Ok(Region::SouthernLp),
            other => Err(ParseRegionError(other.to_string())),
        }
    }
}

/// A monitored ski resort: fixed identity and coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resort {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub region: Region,
}

/// On-disk shape of an optional `resorts.toml` override:
/// repeated `[[resort]]` tables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResortsFile {
    #[serde(default)]
    pub resort: Vec<Resort>,
}

/// Immutable table of all monitored resorts.
#[derive(Debug, Clone)]
pub struct ResortTable {
    resorts: Vec<Resort>,
}

impl ResortTable {
    pub fn new(resorts: Vec<Resort>) -> Self {
        ResortTable { resorts }
    }

    /// Load the table from a discovered `resorts.toml`, or fall back to the
    /// built-in set when no file was found or the file lists no resorts.
    pub fn load(source: &ConfigSource) -> anyhow::Result<Self> {
        let file: ResortsFile = load_config(source)?;
        if file.resort.is_empty() {
            Ok(Self::builtin())
        } else {
            Ok(Self::new(file.resort))
        }
    }

    pub fn get(&self, id: &str) -> Option<&Resort> {
        self.resorts.iter().find(|r| r.id == id)
    }

    pub fn by_region(&self, region: Region) -> impl Iterator<Item = &Resort> {
        self.resorts.iter().filter(move |r| r.region == region)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resort> {
        self.resorts.iter()
    }

    pub fn len(&self) -> usize {
        self.resorts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resorts.is_empty()
    }

    /// The built-in Michigan resort set.
    pub fn builtin() -> Self {
        fn resort(id: &str, name: &str, lat: f64, lon: f64, region: Region) -> Resort {
            Resort {
                id: id.to_string(),
                name: name.to_string(),
                lat,
                lon,
                region,
            }
        }

        ResortTable::new(vec![
            // Western Upper Peninsula
            resort(
                "mount-bohemia",
                "Mount Bohemia",
                47.3934,
                -88.0221,
                Region::WesternUp,
            ),
            resort(
                "mont-ripley",
                "Mont Ripley",
                47.1261,
                -88.5603,
                Region::WesternUp,
            ),
            resort(
                "big-powderhorn",
                "Big Powderhorn Mountain",
                46.5091,
                -90.0617,
                Region::WesternUp,
            ),
            resort(
                "big-snow",
                "Big Snow Resort",
                46.4986,
                -90.0514,
                Region::WesternUp,
            ),
            resort(
                "porcupine-mountains",
                "Porcupine Mountains Ski Area",
                46.7997,
                -89.6727,
                Region::WesternUp,
            ),
            resort(
                "ski-brule",
                "Ski Brule",
                46.0338,
                -88.6890,
                Region::WesternUp,
            ),
            // Eastern Upper Peninsula
            resort(
                "marquette-mountain",
                "Marquette Mountain",
                46.5133,
                -87.4370,
                Region::EasternUp,
            ),
            resort(
                "pine-mountain",
                "Pine Mountain Resort",
                45.8366,
                -88.0766,
                Region::EasternUp,
            ),
            resort(
                "norway-mountain",
                "Norway Mountain",
                45.7791,
                -87.9284,
                Region::EasternUp,
            ),
            // Northern Lower Peninsula
            resort(
                "boyne-mountain",
                "Boyne Mountain",
                45.1637,
                -84.9299,
                Region::NorthernLp,
            ),
            resort(
                "the-highlands",
                "The Highlands at Harbor Springs",
                45.4658,
                -84.9353,
                Region::NorthernLp,
            ),
            resort(
                "nubs-nob",
                "Nub's Nob",
                45.4697,
                -84.9027,
                Region::NorthernLp,
            ),
            resort(
                "shanty-creek",
                "Shanty Creek",
                44.9241,
                -85.2031,
                Region::NorthernLp,
            ),
            resort(
                "crystal-mountain",
                "Crystal Mountain",
                44.5181,
                -85.9937,
                Region::NorthernLp,
            ),
            resort(
                "caberfae-peaks",
                "Caberfae Peaks",
                44.2469,
                -85.7263,
                Region::NorthernLp,
            ),
            resort(
                "treetops",
                "Treetops Resort",
                45.0482,
                -84.6320,
                Region::NorthernLp,
            ),
            // Southern Lower Peninsula
            resort(
                "mt-brighton",
                "Mt. Brighton",
                42.5401,
                -83.8091,
                Region::SouthernLp,
            ),
            resort(
                "alpine-valley",
                "Alpine Valley",
                42.6553,
                -83.5464,
                Region::SouthernLp,
            ),
            resort(
                "mt-holly",
                "Mt. Holly",
                42.8064,
                -83.5633,
                Region::SouthernLp,
            ),
            resort(
                "pine-knob",
                "Pine Knob",
                42.7390,
                -83.3867,
                Region::SouthernLp,
            ),
            resort(
                "bittersweet",
                "Bittersweet Ski Area",
                42.3906,
                -85.7370,
                Region::SouthernLp,
            ),
            resort(
                "cannonsburg",
                "Cannonsburg Ski Area",
                43.0689,
                -85.4735,
                Region::SouthernLp,
            ),
        ])
    }
}
