//! Fetch, mirror, clean and write back, in that order
//!
//! Every phase finishes before the next begins. Store failures abort the run
//! with an error; remote failures are folded into the [`SyncSummary`].

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::application::paginator::ProductPaginator;
use crate::application::tag_rules::TagRuleEngine;
use crate::application::write_back::{WriteBackDriver, WriteBackReport, WriteMode};
use crate::domain::catalog::{CatalogClient, CatalogError};
use crate::domain::pagination::StatusFilter;
use crate::domain::repositories::ProductMirrorRepository;
use crate::domain::tag_rules::{AugmentationRule, AugmentationSummary, ExclusionRule, ExclusionSummary};
use crate::infrastructure::config::AppConfig;

/// What a single run does
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub page_size: u32,
    pub status_filter: StatusFilter,
    pub exclusion: ExclusionRule,
    pub augmentation: AugmentationRule,
    pub mode: WriteMode,
    /// Maximum rows replayed to the catalog; `None` means all of them.
    pub limit: Option<u32>,
    pub run_exclusion: bool,
    pub run_augmentation: bool,
    pub run_write_back: bool,
}

impl SyncOptions {
    /// Every phase enabled, write-back in dry-run mode.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            page_size: config.sync.page_size,
            status_filter: StatusFilter::from_active_only(config.sync.active_only),
            exclusion: config.exclusion_rule(),
            augmentation: config.augmentation_rule(),
            mode: WriteMode::DryRun,
            limit: None,
            run_exclusion: true,
            run_augmentation: true,
            run_write_back: true,
        }
    }
}

/// Counts from every phase that ran
#[derive(Debug, Default)]
pub struct SyncSummary {
    pub fetched: usize,
    pub pages_fetched: u32,
    pub filtered_out: u32,
    pub fetch_interruption: Option<CatalogError>,
    pub saved: u64,
    pub exclusion: Option<ExclusionSummary>,
    pub augmentation: Option<AugmentationSummary>,
    pub write_back: Option<WriteBackReport>,
}

impl SyncSummary {
    /// True when the listing was read to the end and no record failed to update.
    pub fn is_clean(&self) -> bool {
        self.fetch_interruption.is_none() && self.write_back.as_ref().is_none_or(WriteBackReport::is_clean)
    }
}

pub struct SyncPipeline<'a, C, R>
where
    C: CatalogClient + ?Sized,
    R: ProductMirrorRepository + ?Sized,
{
    client: &'a C,
    mirror: &'a R,
    options: SyncOptions,
}

impl<'a, C, R> SyncPipeline<'a, C, R>
where
    C: CatalogClient + ?Sized,
    R: ProductMirrorRepository + ?Sized,
{
    pub fn new(client: &'a C, mirror: &'a R, options: SyncOptions) -> Self {
        Self { client, mirror, options }
    }

    pub async fn run(&self) -> Result<SyncSummary> {
        let options = &self.options;
        let mut summary = SyncSummary::default();

        // Listing
        let outcome = ProductPaginator::new(self.client, options.page_size, options.status_filter)
            .fetch_all()
            .await;
        summary.fetched = outcome.products.len();
        summary.pages_fetched = outcome.pages_fetched;
        summary.filtered_out = outcome.filtered_out;

        // Mirror
        summary.saved = self
            .mirror
            .replace_all(&outcome.products)
            .await
            .context("Failed to save products to the mirror")?;
        info!("💾 Products saved to mirror: {}", summary.saved);
        if let Some(e) = outcome.interruption {
            warn!("⚠️ Mirror holds a partial listing: {}", e);
            summary.fetch_interruption = Some(e);
        }

        // Rules
        let rules = TagRuleEngine::new(self.mirror);
        if options.run_exclusion {
            summary.exclusion = Some(
                rules
                    .exclude(&options.exclusion)
                    .await
                    .context("Exclusion pass failed")?,
            );
        } else {
            info!("⏭️ Exclusion pass skipped");
        }
        if options.run_augmentation {
            summary.augmentation = Some(
                rules
                    .augment(&options.augmentation)
                    .await
                    .context("Augmentation pass failed")?,
            );
        } else {
            info!("⏭️ Augmentation pass skipped");
        }

        // Write-back
        if options.run_write_back {
            let report = WriteBackDriver::new(self.client)
                .apply(self.mirror, options.mode, options.limit)
                .await
                .context("Failed to read products for write-back")?;
            summary.write_back = Some(report);
        } else {
            info!("⏭️ Write-back skipped");
        }

        Ok(summary)
    }
}
