//! shopify-tag-sync
//!
//! Usage:
//!     shopify-tag-sync [--apply] [--limit N] [--config PATH] [--database PATH]

use clap::Parser;
use std::process::ExitCode;

use shopify_tag_sync_lib::cli::{Cli, EXIT_FATAL};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match shopify_tag_sync_lib::run(cli).await {
        Ok(status) => ExitCode::from(status),
        Err(e) => {
            // Logging may not be up yet when configuration fails.
            eprintln!("❌ {:#}", e);
            tracing::error!("❌ Sync aborted: {:#}", e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}
