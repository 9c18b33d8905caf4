//! Snowline Core Library
//!
//! Shared pieces used by the daemon and server:
//! - Configuration loading (XDG-compliant)
//! - The immutable resort/region reference table

mod config;
mod resorts;

pub use config::{find_config_file, get_xdg_data_dir, load_config, ConfigSource};
pub use resorts::{ParseRegionError, Region, Resort, ResortTable, ResortsFile};

/// Application name used for XDG paths
pub const APP_NAME: &str = "snowline";

/// Default server port
pub const DEFAULT_SERVER_PORT: u16 = 9600;

/// Default daemon schedule-check interval (5 minutes)
pub const DEFAULT_CHECK_INTERVAL: u64 = 300;
