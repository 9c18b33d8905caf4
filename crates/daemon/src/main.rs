mod cli;
mod schedule;

use std::time::Duration;

use anyhow::Context;
use slog::{error, info, Logger};
use snowline_core::{find_config_file, Region, ResortTable};
use snowline_forecast::{refresh_region, NwsClient, SqliteCache, DEFAULT_API_BASE, DEFAULT_NDFD_BASE};
use time::OffsetDateTime;
use tokio::time::interval;

use cli::{get_config_info, setup_logger, Cli};
use schedule::{region_hour, RegionSchedule};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = get_config_info();
    let logger = setup_logger(cli.level.as_deref());

    info!(logger, "Snowline daemon starting...");
    info!(logger, "  Cache db: {}", cli.db_path());
    info!(logger, "  Check interval: {} seconds", cli.check_interval());

    let resorts = ResortTable::load(&find_config_file("SNOWLINE_RESORTS", "resorts.toml"))
        .context("failed to load resort table")?;
    info!(logger, "  Monitoring {} resorts", resorts.len());

    let source = NwsClient::new(logger.clone(), &cli.user_agent())
        .context("failed to build NWS client")?
        .with_base_urls(
            cli.api_base.clone().unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            cli.ndfd_base.clone().unwrap_or_else(|| DEFAULT_NDFD_BASE.to_string()),
        );
    let cache = SqliteCache::new(&cli.db_path())
        .await
        .context("failed to open forecast cache")?;

    // One-shot mode: refresh a single region and exit.
    if let Some(ref region) = cli.region {
        let region: Region = region.parse()?;
        let summary = refresh_region(region, &resorts, &source, &cache, &logger).await;
        info!(
            logger,
            "one-shot refresh of {} complete: {} updated, {} failed",
            region,
            summary.refreshed,
            summary.failed
        );
        return Ok(());
    }

    run_schedule(&cli, logger, resorts, source, cache).await;
    Ok(())
}

async fn run_schedule(
    cli: &Cli,
    logger: Logger,
    resorts: ResortTable,
    source: NwsClient,
    cache: SqliteCache,
) {
    for (index, region) in Region::all().iter().enumerate() {
        info!(
            logger,
            "  {} refreshes daily at {:02}:00 UTC",
            region,
            region_hour(index, cli.base_hour(), cli.stagger_hours())
        );
    }

    let mut schedule = RegionSchedule::new(cli.base_hour(), cli.stagger_hours());
    let mut ticker = interval(Duration::from_secs(cli.check_interval()));
    loop {
        ticker.tick().await;
        let now = OffsetDateTime::now_utc();
        for region in schedule.due(now) {
            let summary = refresh_region(region, &resorts, &source, &cache, &logger).await;
            schedule.mark_run(region, now);
            if summary.failed > 0 {
                error!(
                    logger,
                    "region {} refreshed with {} failures", region, summary.failed
                );
            }
        }
    }
}
