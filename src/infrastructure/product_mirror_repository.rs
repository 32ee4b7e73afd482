//! SQLite implementation of the product mirror
//!
//! Each bulk operation runs in its own transaction. Tag predicates are bound
//! as parameters; nothing from configuration is spliced into SQL text.

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::debug;

use crate::domain::product::{MirrorRow, ProductRecord};
use crate::domain::repositories::ProductMirrorRepository;
use crate::domain::tag_rules::{AugmentationRule, ExclusionRule};

#[derive(Clone)]
pub struct SqliteProductMirror {
    pool: SqlitePool,
}

impl SqliteProductMirror {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductMirrorRepository for SqliteProductMirror {
    async fn replace_all(&self, products: &[ProductRecord]) -> Result<u64> {
        let mut tx = self.pool.begin().await.context("Failed to begin replace transaction")?;

        let cleared = sqlx::query("DELETE FROM products")
            .execute(&mut *tx)
            .await
            .context("Failed to clear products table")?
            .rows_affected();
        debug!("Cleared {} mirrored products", cleared);

        for product in products {
            sqlx::query("INSERT INTO products (shopify_id, title, tags) VALUES (?, ?, ?)")
                .bind(&product.id)
                .bind(&product.title)
                .bind(product.flattened_tags())
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to insert product {}", product.id))?;
        }

        // Dropping `tx` on any error above rolls the whole replace back.
        tx.commit().await.context("Failed to commit replace transaction")?;
        Ok(products.len() as u64)
    }

    async fn delete_excluded(&self, rule: &ExclusionRule) -> Result<u64> {
        if rule.is_empty() {
            return Ok(0);
        }

        // instr() is case-sensitive, unlike LIKE, which matches the rule's semantics.
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("DELETE FROM products WHERE ");
        let mut predicates = query.separated(" OR ");
        for needle in &rule.substrings {
            predicates.push("instr(tags, ");
            predicates.push_bind_unseparated(needle.as_str());
            predicates.push_unseparated(") > 0");
        }

        let mut tx = self.pool.begin().await.context("Failed to begin exclusion transaction")?;
        let removed = query
            .build()
            .execute(&mut *tx)
            .await
            .context("Failed to delete excluded products")?
            .rows_affected();
        tx.commit().await.context("Failed to commit exclusion transaction")?;

        Ok(removed)
    }

    async fn append_tag(&self, rule: &AugmentationRule) -> Result<u64> {
        let mut tx = self.pool.begin().await.context("Failed to begin augmentation transaction")?;
        let updated = sqlx::query(
            r#"
            UPDATE products
            SET tags = CASE
                WHEN tags = '' THEN ?
                ELSE tags || ',' || ?
            END
            "#,
        )
        .bind(&rule.tag)
        .bind(&rule.tag)
        .execute(&mut *tx)
        .await
        .context("Failed to append tag to products")?
        .rows_affected();
        tx.commit().await.context("Failed to commit augmentation transaction")?;

        Ok(updated)
    }

    async fn list(&self, limit: Option<u32>) -> Result<Vec<MirrorRow>> {
        // SQLite treats a negative LIMIT as "no limit".
        let limit = limit.map_or(-1, i64::from);
        let rows = sqlx::query("SELECT shopify_id, title, tags FROM products ORDER BY rowid LIMIT ?")
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .context("Failed to read mirrored products")?;

        Ok(rows
            .into_iter()
            .map(|row| MirrorRow {
                shopify_id: row.get("shopify_id"),
                title: row.get("title"),
                tags: row.get("tags"),
            })
            .collect())
    }

    async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count mirrored products")?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}
