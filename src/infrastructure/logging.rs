//! Logging system configuration and initialization
//!
//! - Console output with local timestamps
//! - Optional file output through a non-blocking appender
//! - Optional JSON formatting for the file layer
//! - Old log cleanup keeping the newest `max_files`

#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use chrono::Local;
use lazy_static::lazy_static;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;
use crate::infrastructure::config::AppConfig;

/// Log file written by the current run
pub const LOG_FILE_NAME: &str = "shopify-tag-sync.log";

// Keeps the file writer alive until the process exits
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> = Mutex::new(Vec::new());
}

/// Local wall-clock timestamps with millisecond precision
struct LocalTimeFormatter;

impl FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Directory log files go to
pub fn get_log_directory(config: &LoggingConfig) -> PathBuf {
    config
        .log_dir
        .clone()
        .unwrap_or_else(|| AppConfig::app_data_dir().join("logs"))
}

/// Console layer with minimal formatting (time + level + message)
fn console_layer<S>(enabled: bool) -> Option<impl Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'span> LookupSpan<'span>,
{
    enabled.then(|| {
        fmt::Layer::new()
            .with_writer(std::io::stdout)
            .with_timer(LocalTimeFormatter)
            .with_target(false)
    })
}

/// Builds the filter: `RUST_LOG` wins; otherwise the configured level for
/// this crate and quieter dependencies unless TRACE is requested.
fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut filter = EnvFilter::try_new(&config.level)
        .map_err(|e| anyhow!("Invalid log level '{}': {}", config.level, e))?;

    if !config.level.to_lowercase().contains("trace") {
        for directive in [
            "sqlx::query=warn",
            "sqlx::sqlite=warn",
            "reqwest=info",
            "hyper=warn",
            "hyper_util=warn",
            "h2=warn",
            "rustls=warn",
        ] {
            filter = filter.add_directive(directive.parse()?);
        }
        filter = filter.add_directive(format!("shopify_tag_sync_lib={}", config.level).parse()?);
    }

    Ok(filter)
}

/// Initialize logging with custom configuration
///
/// Override the filtering with `RUST_LOG`, e.g.
/// ```bash
/// RUST_LOG="debug,sqlx::query=debug" shopify-tag-sync
/// ```
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let env_filter = build_env_filter(config)?;
    let registry = Registry::default().with(env_filter);

    if !config.file_output {
        if !config.console_output {
            return Err(anyhow!("No logging output configured"));
        }
        registry.with(console_layer(true)).try_init()?;
        info!("Logging system initialized (console only, level {})", config.level);
        return Ok(());
    }

    let log_dir = get_log_directory(config);
    std::fs::create_dir_all(&log_dir)
        .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", log_dir, e))?;

    prepare_log_directory(&log_dir, config.max_files)?;

    let file_appender = rolling::never(&log_dir, LOG_FILE_NAME);
    let (file_writer, file_guard) = non_blocking(file_appender);
    LOG_GUARDS
        .lock()
        .map_err(|_| anyhow!("Log guard registry poisoned"))?
        .push(file_guard);

    if config.json_format {
        let file_layer = fmt::Layer::new()
            .json()
            .with_writer(file_writer)
            .with_timer(LocalTimeFormatter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false);
        registry
            .with(file_layer)
            .with(console_layer(config.console_output))
            .try_init()?;
    } else {
        let file_layer = fmt::Layer::new()
            .with_writer(file_writer)
            .with_timer(LocalTimeFormatter)
            .with_target(false)
            .with_ansi(false);
        registry
            .with(file_layer)
            .with(console_layer(config.console_output))
            .try_init()?;
    }

    info!("Logging system initialized");
    info!("Log directory: {:?}", log_dir);
    info!("Log level: {}", config.level);
    info!("JSON format: {}", config.json_format);
    Ok(())
}

/// Moves the previous log aside and prunes old logs, leaving room for the
/// file this run is about to open so that at most `max_files` remain.
fn prepare_log_directory(log_dir: &Path, max_files: u32) -> Result<()> {
    rotate_existing_log_file(log_dir)?;
    cleanup_old_logs(log_dir, max_files.saturating_sub(1))?;
    Ok(())
}

/// Renames the previous run's log so every run starts a fresh file
fn rotate_existing_log_file(log_dir: &Path) -> Result<()> {
    let log_file_path = log_dir.join(LOG_FILE_NAME);
    if !log_file_path.exists() {
        return Ok(());
    }

    let metadata = std::fs::metadata(&log_file_path)
        .map_err(|e| anyhow!("Failed to get log file metadata: {}", e))?;
    let file_time = metadata
        .modified()
        .unwrap_or_else(|_| std::time::SystemTime::now());
    let datetime: chrono::DateTime<Local> = file_time.into();

    let file_stem = LOG_FILE_NAME.trim_end_matches(".log");
    let stamp = datetime.format("%Y%m%dT%H%M%S%.3f").to_string();
    let mut timestamped_path = log_dir.join(format!("{}.{}.log", file_stem, stamp));
    let mut counter = 1;
    while timestamped_path.exists() {
        timestamped_path = log_dir.join(format!("{}.{}-{}.log", file_stem, stamp, counter));
        counter += 1;
    }

    std::fs::rename(&log_file_path, &timestamped_path).map_err(|e| {
        anyhow!(
            "Failed to rotate log file {} to {}: {}",
            log_file_path.display(),
            timestamped_path.display(),
            e
        )
    })?;
    Ok(())
}

/// Deletes the oldest `.log` files so that at most `max_files` remain
fn cleanup_old_logs(log_dir: &Path, max_files: u32) -> Result<usize> {
    if !log_dir.exists() {
        return Ok(0);
    }

    let mut log_files = Vec::new();
    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".log"));
        if path.is_file() && is_log {
            if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
                log_files.push((path, modified));
            }
        }
    }

    // Newest first
    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    let mut removed = 0;
    for (path, _) in log_files.iter().skip(max_files as usize) {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Failed to remove old log file {:?}: {}", path, e);
        } else {
            removed += 1;
        }
    }
    Ok(removed)
}

/// Log run information for diagnostics
pub fn log_system_info(config: &AppConfig) {
    info!("=== shopify-tag-sync {} ===", env!("CARGO_PKG_VERSION"));
    info!("Loaded configuration for shop {}", config.shop_url);
    info!("API version: {}", config.api_version);
    info!("Database: {:?}", config.database_path);
    if let Ok(current_dir) = std::env::current_dir() {
        info!("Working directory: {:?}", current_dir);
    }
}
