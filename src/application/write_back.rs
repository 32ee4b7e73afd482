//! Replays mirrored tag sets to the remote catalog
//!
//! One `productUpdate` per record, strictly in mirror order. A failing record
//! is counted and logged; the next record is still attempted.

#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::domain::catalog::{CatalogClient, CatalogError, UserError};
use crate::domain::product::ProductRecord;
use crate::domain::repositories::ProductMirrorRepository;

/// Whether write-back mutates the remote catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Log what would change, contact nothing.
    #[default]
    DryRun,
    Apply,
}

impl WriteMode {
    pub fn from_apply_flag(apply: bool) -> Self {
        if apply { Self::Apply } else { Self::DryRun }
    }

    pub fn is_dry_run(self) -> bool {
        self == Self::DryRun
    }
}

#[derive(Error, Debug)]
pub enum WriteBackFailure {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Update rejected: {}", join_user_errors(.0))]
    Rejected(Vec<UserError>),
}

fn join_user_errors(errors: &[UserError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

#[derive(Debug)]
pub enum TagUpdateOutcome {
    WouldUpdate,
    Updated,
    Failed(WriteBackFailure),
}

impl TagUpdateOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Outcome for one record, in the order records were processed
#[derive(Debug)]
pub struct RecordOutcome {
    pub product_id: String,
    pub title: String,
    pub outcome: TagUpdateOutcome,
}

#[derive(Debug, Default)]
pub struct WriteBackReport {
    pub mode: WriteMode,
    /// Mutations actually issued
    pub attempted: u32,
    pub succeeded: u32,
    pub failed: u32,
    pub would_update: u32,
    pub outcomes: Vec<RecordOutcome>,
}

impl WriteBackReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }

    fn record(&mut self, product: &ProductRecord, outcome: TagUpdateOutcome) {
        match &outcome {
            TagUpdateOutcome::WouldUpdate => self.would_update += 1,
            TagUpdateOutcome::Updated => {
                self.attempted += 1;
                self.succeeded += 1;
            }
            TagUpdateOutcome::Failed(_) => {
                self.attempted += 1;
                self.failed += 1;
            }
        }
        self.outcomes.push(RecordOutcome {
            product_id: product.id.clone(),
            title: product.title.clone(),
            outcome,
        });
    }
}

pub struct WriteBackDriver<'a, C: CatalogClient + ?Sized> {
    client: &'a C,
}

impl<'a, C: CatalogClient + ?Sized> WriteBackDriver<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Reads up to `limit` mirrored rows (all when `None`) and pushes their tags.
    ///
    /// Only reading the mirror can fail the call; remote failures are
    /// per-record outcomes inside the report.
    pub async fn apply<R>(&self, mirror: &R, mode: WriteMode, limit: Option<u32>) -> Result<WriteBackReport>
    where
        R: ProductMirrorRepository + ?Sized,
    {
        let records: Vec<ProductRecord> = mirror
            .list(limit)
            .await?
            .into_iter()
            .map(|row| row.into_record())
            .collect();
        Ok(self.push_tags(&records, mode).await)
    }

    pub async fn push_tags(&self, records: &[ProductRecord], mode: WriteMode) -> WriteBackReport {
        let mut report = WriteBackReport {
            mode,
            ..WriteBackReport::default()
        };

        info!(
            "{}Preparing to update {} products...",
            if mode.is_dry_run() { "DRY RUN: " } else { "" },
            records.len()
        );

        for product in records {
            let outcome = match mode {
                WriteMode::DryRun => {
                    info!("Would update {}: {:?}", product.title, product.tags);
                    TagUpdateOutcome::WouldUpdate
                }
                WriteMode::Apply => self.push_one(product).await,
            };
            report.record(product, outcome);
        }

        match mode {
            WriteMode::DryRun => info!("Would have updated {} products successfully", report.would_update),
            WriteMode::Apply => {
                info!("✅ Updated {} products successfully", report.succeeded);
                if report.failed > 0 {
                    warn!("⚠️ Failed to update {} products", report.failed);
                }
            }
        }
        report
    }

    async fn push_one(&self, product: &ProductRecord) -> TagUpdateOutcome {
        match self.client.update_product_tags(&product.id, &product.tags).await {
            Ok(result) if result.is_accepted() => {
                info!("Updated {}", product.title);
                TagUpdateOutcome::Updated
            }
            Ok(result) => {
                let failure = WriteBackFailure::Rejected(result.user_errors);
                error!("❌ User errors for {}: {}", product.title, failure);
                TagUpdateOutcome::Failed(failure)
            }
            Err(e) => {
                if e.is_transport() {
                    error!("❌ Request failed for {}: {}", product.title, e);
                } else {
                    error!("❌ GraphQL errors for {}: {}", product.title, e);
                }
                TagUpdateOutcome::Failed(e.into())
            }
        }
    }
}
