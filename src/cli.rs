//! Command line arguments
//!
//! Usage:
//!     shopify-tag-sync                   # dry run over the whole catalog
//!     shopify-tag-sync --apply --limit 10

use clap::Parser;
use std::path::PathBuf;

use crate::application::write_back::WriteMode;

/// Every phase ran and nothing failed.
pub const EXIT_SUCCESS: u8 = 0;
/// Configuration or local store failure; the run did not complete.
pub const EXIT_FATAL: u8 = 1;
/// The run completed but the listing was cut short or some updates failed.
pub const EXIT_DEGRADED: u8 = 2;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "shopify-tag-sync", version, about = "Update Shopify product tags")]
pub struct Cli {
    /// Actually apply the changes to Shopify (default is dry-run)
    #[arg(long)]
    pub apply: bool,

    /// Number of products to update (default is all products)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub limit: Option<u32>,

    /// Config file (toml, json, yaml); defaults to ./shopify_tag_sync.* when present
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// SQLite mirror file, overriding `database_path` from the config
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Keep products carrying excluded tags in the mirror
    #[arg(long)]
    pub skip_exclusion: bool,

    /// Do not append the augmentation tag
    #[arg(long)]
    pub skip_augmentation: bool,

    /// Stop after the local passes without contacting Shopify for updates
    #[arg(long)]
    pub no_write_back: bool,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn write_mode(&self) -> WriteMode {
        WriteMode::from_apply_flag(self.apply)
    }
}
