mod cli;
mod routes;

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use axum::serve;
use slog::info;
use snowline_core::{find_config_file, ResortTable};
use snowline_forecast::{NwsClient, SqliteCache, DEFAULT_API_BASE, DEFAULT_NDFD_BASE};
use tokio::net::TcpListener;

use cli::{get_config_info, setup_logger};
use routes::{app, AppState};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = get_config_info();
    let logger = setup_logger(cli.level.as_deref());

    let socket_addr = SocketAddr::from_str(&format!("{}:{}", cli.host(), cli.port()))
        .context("invalid listen address")?;

    info!(logger, "Snowline server starting...");
    info!(logger, "  Listen: http://{}", socket_addr);
    info!(logger, "  Cache db: {}", cli.db_path());

    let resorts = ResortTable::load(&find_config_file("SNOWLINE_RESORTS", "resorts.toml"))
        .context("failed to load resort table")?;
    info!(logger, "  Serving {} resorts", resorts.len());

    let source = NwsClient::new(logger.clone(), &cli.user_agent())
        .context("failed to build NWS client")?
        .with_base_urls(
            cli.api_base.clone().unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            cli.ndfd_base.clone().unwrap_or_else(|| DEFAULT_NDFD_BASE.to_string()),
        );
    let cache = SqliteCache::new(&cli.db_path())
        .await
        .context("failed to open forecast cache")?;

    let state = AppState {
        resorts: Arc::new(resorts),
        cache: Arc::new(cache),
        source: Arc::new(source),
        logger: logger.clone(),
    };

    let listener = TcpListener::bind(socket_addr)
        .await
        .context("error binding to socket")?;

    serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!(logger, "Snowline server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
