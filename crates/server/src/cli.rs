use clap::Parser;
use slog::{o, Drain, Level, Logger};
use snowline_core::{
    find_config_file, get_xdg_data_dir, load_config, ConfigSource, DEFAULT_SERVER_PORT,
};
use std::env;

#[derive(Parser, Clone, Debug, serde::Deserialize, Default)]
#[command(
    author,
    version,
    about = "Snowline server - serves cached resort snow forecasts over HTTP"
)]
pub struct Cli {
    /// Path to config file (TOML format)
    /// Searched in order: this flag, $SNOWLINE_SERVER_CONFIG, ./server.toml,
    /// $XDG_CONFIG_HOME/snowline/server.toml, /etc/snowline/server.toml
    #[arg(short, long)]
    #[serde(skip)]
    pub config: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, env = "SNOWLINE_SERVER_LEVEL")]
    pub level: Option<String>,

    /// Address to bind
    #[arg(long, env = "SNOWLINE_SERVER_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "SNOWLINE_SERVER_PORT")]
    pub port: Option<u16>,

    /// Path to the SQLite forecast cache (shared with the daemon)
    #[arg(short, long, env = "SNOWLINE_SERVER_DB_PATH")]
    pub db_path: Option<String>,

    /// HTTP User-Agent header for NWS API requests
    #[arg(short, long, env = "SNOWLINE_SERVER_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Base URL of the api.weather.gov JSON API
    #[arg(long, env = "SNOWLINE_SERVER_API_BASE")]
    pub api_base: Option<String>,

    /// Base URL of the NDFD XML client endpoint
    #[arg(long, env = "SNOWLINE_SERVER_NDFD_BASE")]
    pub ndfd_base: Option<String>,
}

impl Cli {
    pub fn host(&self) -> String {
        self.host.clone().unwrap_or_else(|| "127.0.0.1".to_string())
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_SERVER_PORT)
    }

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
            .unwrap_or_else(|| "snowline-server/0.1".to_string())
    }
}

/// Load configuration from CLI args, config file, and environment
pub fn get_config_info() -> Cli {
    let cli_args = Cli::parse();

    let source = if let Some(ref path) = cli_args.config {
        ConfigSource::Explicit(path.into())
    } else {
        find_config_file("SNOWLINE_SERVER_CONFIG", "server.toml")
    };

    let file_config: Cli = load_config(&source).unwrap_or_default();

    // CLI args override file config (env vars are handled by clap)
    Cli {
        config: cli_args.config,
        level: cli_args.level.or(file_config.level),
        host: cli_args.host.or(file_config.host),
        port: cli_args.port.or(file_config.port),
        db_path: cli_args.db_path.or(file_config.db_path),
        user_agent: cli_args.user_agent.or(file_config.user_agent),
        api_base: cli_args.api_base.or(file_config.api_base),
        ndfd_base: cli_args.ndfd_base.or(file_config.ndfd_base),
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
