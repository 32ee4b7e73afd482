//! Rule passes over the mirrored snapshot

#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use tracing::info;

use crate::domain::repositories::ProductMirrorRepository;
use crate::domain::tag_rules::{AugmentationRule, AugmentationSummary, ExclusionRule, ExclusionSummary};

/// Runs the exclusion and augmentation passes against the mirror.
pub struct TagRuleEngine<'a, R: ProductMirrorRepository + ?Sized> {
    mirror: &'a R,
}

impl<'a, R: ProductMirrorRepository + ?Sized> TagRuleEngine<'a, R> {
    pub fn new(mirror: &'a R) -> Self {
        Self { mirror }
    }

    /// Deletes every row whose tags contain one of the rule's substrings.
    pub async fn exclude(&self, rule: &ExclusionRule) -> Result<ExclusionSummary> {
        let removed = self.mirror.delete_excluded(rule).await?;
        let remaining = self.mirror.count().await?;

        info!("🧹 Removed {} products with excluded tags", removed);
        info!("📦 Remaining products in database: {}", remaining);
        Ok(ExclusionSummary { removed, remaining })
    }

    /// Appends the rule's tag to every remaining row.
    pub async fn augment(&self, rule: &AugmentationRule) -> Result<AugmentationSummary> {
        let updated = self.mirror.append_tag(rule).await?;
        info!("🏷️ Added '{}' tag to {} products", rule.tag, updated);
        Ok(AugmentationSummary { updated })
    }
}
