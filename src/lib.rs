//! shopify-tag-sync - Shopify product tag maintenance
//!
//! Mirrors the catalog's products into SQLite, drops products carrying
//! excluded tags, appends a tag to the rest and pushes the resulting tag sets
//! back through the Admin GraphQL API (dry-run unless asked otherwise).

// Module declarations
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
pub(crate) mod test_utils;

use anyhow::{Context, Result};
use tracing::info;

use crate::application::sync_pipeline::{SyncOptions, SyncPipeline, SyncSummary};
use crate::cli::{Cli, EXIT_DEGRADED, EXIT_SUCCESS};
use crate::infrastructure::{
    AppConfig, DatabaseConnection, ShopifyClient, SqliteProductMirror, init_logging_with_config, log_system_info,
};

/// Applies command line overrides on top of the loaded configuration.
pub fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(database) = &cli.database {
        config.database_path.clone_from(database);
    }
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    Ok(config)
}

pub fn sync_options(config: &AppConfig, cli: &Cli) -> SyncOptions {
    SyncOptions {
        mode: cli.write_mode(),
        limit: cli.limit,
        run_exclusion: !cli.skip_exclusion,
        run_augmentation: !cli.skip_augmentation,
        run_write_back: !cli.no_write_back,
        ..SyncOptions::from_config(config)
    }
}

/// Runs one sync and returns the process exit status.
///
/// Errors are fatal (configuration or local store); a run that completed
/// with remote failures returns [`EXIT_DEGRADED`].
pub async fn run(cli: Cli) -> Result<u8> {
    let config = resolve_config(&cli)?;
    init_logging_with_config(&config.logging)?;
    log_system_info(&config);

    let client = ShopifyClient::from_config(&config)?;
    let database = DatabaseConnection::open_file(&config.database_path)
        .await
        .context("Failed to open the product mirror")?;
    database.migrate().await?;
    let mirror = SqliteProductMirror::new(database.pool().clone());

    let summary = SyncPipeline::new(&client, &mirror, sync_options(&config, &cli))
        .run()
        .await?;
    log_summary(&summary);

    Ok(if summary.is_clean() { EXIT_SUCCESS } else { EXIT_DEGRADED })
}

fn log_summary(summary: &SyncSummary) {
    info!("=== Sync summary ===");
    info!("Fetched: {} products over {} pages", summary.fetched, summary.pages_fetched);
    if let Some(e) = &summary.fetch_interruption {
        info!("Listing interrupted: {}", e);
    }
    if let Some(exclusion) = &summary.exclusion {
        info!("Excluded: {} (remaining {})", exclusion.removed, exclusion.remaining);
    }
    if let Some(augmentation) = &summary.augmentation {
        info!("Augmented: {}", augmentation.updated);
    }
    if let Some(report) = &summary.write_back {
        info!(
            "Write-back ({:?}): attempted {}, succeeded {}, failed {}, would update {}",
            report.mode, report.attempted, report.succeeded, report.failed, report.would_update
        );
    }
}
