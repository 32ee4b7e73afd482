//! Repository interfaces for the local product mirror.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::product::{MirrorRow, ProductRecord};
use crate::domain::tag_rules::{AugmentationRule, ExclusionRule};

/// Keyed `products` table holding the snapshot of the last fetch.
///
/// Every bulk operation runs in its own transaction: it either fully lands
/// or leaves the table as it was.
#[async_trait]
pub trait ProductMirrorRepository: Send + Sync {
    /// Deletes every row, then inserts one row per record. Returns rows inserted.
    async fn replace_all(&self, products: &[ProductRecord]) -> Result<u64>;

    /// Deletes rows matched by `rule`. Returns rows deleted.
    async fn delete_excluded(&self, rule: &ExclusionRule) -> Result<u64>;

    /// Rewrites every row's tags through `rule`. Returns rows updated.
    async fn append_tag(&self, rule: &AugmentationRule) -> Result<u64>;

    /// Rows in insertion order, at most `limit` of them when set.
    async fn list(&self, limit: Option<u32>) -> Result<Vec<MirrorRow>>;

    async fn count(&self) -> Result<u64>;
}
