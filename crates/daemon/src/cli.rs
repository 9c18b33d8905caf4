use clap::Parser;
use slog::{o, Drain, Level, Logger};
use snowline_core::{find_config_file, get_xdg_data_dir, load_config, ConfigSource, DEFAULT_CHECK_INTERVAL};
use std::env;

#[derive(Parser, Clone, Debug, serde::Deserialize, Default)]
#[command(
    author,
    version,
    about = "Snowline daemon - refreshes resort snow forecasts on a staggered regional schedule"
)]
pub struct Cli {
    /// Path to config file (TOML format)
    /// Searched in order: this flag, $SNOWLINE_DAEMON_CONFIG, ./daemon.toml,
    /// $XDG_CONFIG_HOME/snowline/daemon.toml, /etc/snowline/daemon.toml
    #[arg(short, long)]
    #[serde(skip)]
    pub config: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, env = "SNOWLINE_DAEMON_LEVEL")]
    pub level: Option<String>,

    /// Path to the SQLite forecast cache
    #[arg(short, long, env = "SNOWLINE_DAEMON_DB_PATH")]
    pub db_path: Option<String>,

    /// HTTP User-Agent header for NWS API requests
    #[arg(short, long, env = "SNOWLINE_DAEMON_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Base URL of the api.weather.gov JSON API
    #[arg(long, env = "SNOWLINE_DAEMON_API_BASE")]
    pub api_base: Option<String>,

    /// Base URL of the NDFD XML client endpoint
    #[arg(long, env = "SNOWLINE_DAEMON_NDFD_BASE")]
    pub ndfd_base: Option<String>,

    /// Seconds between schedule checks
    #[arg(short = 'i', long, env = "SNOWLINE_DAEMON_CHECK_INTERVAL")]
    pub check_interval: Option<u64>,

    /// UTC hour at which the first region refreshes each day
    #[arg(long, env = "SNOWLINE_DAEMON_BASE_HOUR")]
    pub base_hour: Option<u8>,

    /// Hours between consecutive regions' refresh slots
    #[arg(long, env = "SNOWLINE_DAEMON_STAGGER_HOURS")]
    pub stagger_hours: Option<u8>,

    /// Refresh a single region immediately and exit (e.g. "western-up")
    #[arg(short, long)]
    #[serde(skip)]
    pub region: Option<String>,
}

impl Cli {
    pub fn db_path(&self) -> String {
        self.db_path.clone().unwrap_or_else(|| {
            get_xdg_data_dir()
                .join("forecasts.sqlite")
                .display()
                .to_string()
        })
    }

    pub fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| "snowline-daemon/0.1".to_string())
    }

    pub fn check_interval(&self) -> u64 {
        self.check_interval.unwrap_or(DEFAULT_CHECK_INTERVAL)
    }

    pub fn base_hour(&self) -> u8 {
        self.base_hour.unwrap_or(9) % 24
    }

    pub fn stagger_hours(&self) -> u8 {
        self.stagger_hours.unwrap_or(2)
    }
}

/// Load configuration from CLI args, config file, and environment
pub fn get_config_info() -> Cli {
    let cli_args = Cli::parse();

    let source = if let Some(ref path) = cli_args.config {
        ConfigSource::Explicit(path.into())
    } else {
        find_config_file("SNOWLINE_DAEMON_CONFIG", "daemon.toml")
    };

    let file_config: Cli = load_config(&source).unwrap_or_default();

    // CLI args override file config (env vars are handled by clap)
    Cli {
        config: cli_args.config,
        level: cli_args.level.or(file_config.level),
        db_path: cli_args.db_path.or(file_config.db_path),
        user_agent: cli_args.user_agent.or(file_config.user_agent),
        api_base: cli_args.api_base.or(file_config.api_base),
        ndfd_base: cli_args.ndfd_base.or(file_config.ndfd_base),
        check_interval: cli_args.check_interval.or(file_config.check_interval),
        base_hour: cli_args.base_hour.or(file_config.base_hour),
        stagger_hours: cli_args.stagger_hours.or(file_config.stagger_hours),
        region: cli_args.region,
    }
}

pub fn setup_logger(level: Option<&str>) -> Logger {
    let configured = level
        .map(str::to_string)
        .or_else(|| env::var("RUST_LOG").ok())
        .unwrap_or_default();
    let log_level = match configured.to_lowercase().as_str() {
        "trace" => Level::Trace,
        "debug" => Level::Debug,
        "warn" => Level::Warning,
        "error" => Level::Error,
        _ => Level::Info,
    };

    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::CompactFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let drain = drain.filter_level(log_level).fuse();
    slog::Logger::root(drain, o!("version" => env!("CARGO_PKG_VERSION")))
}
