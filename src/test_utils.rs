//! Test utilities for shopify-tag-sync
//!
//! An in-memory mirror database and a scripted catalog that stands in for
//! the Shopify Admin API behind [`CatalogClient`].

use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use crate::domain::catalog::{
    CatalogClient, CatalogError, GraphQlError, PageCursor, ProductEdge, ProductPage, TagUpdateResult, UserError,
};
use crate::domain::product::{ProductRecord, ProductStatus};
use crate::infrastructure::{DatabaseConnection, SqliteProductMirror};

/// Fresh migrated in-memory database
pub struct TestDatabase {
    pub connection: DatabaseConnection,
}

impl TestDatabase {
    pub async fn new() -> Result<Self> {
        let connection = DatabaseConnection::new("sqlite::memory:").await?;
        connection.migrate().await?;
        Ok(Self { connection })
    }

    pub fn mirror(&self) -> SqliteProductMirror {
        SqliteProductMirror::new(self.connection.pool().clone())
    }
}

/// `count` ACTIVE products numbered from `first`, each tagged with `tags`.
pub fn active_products(first: u32, count: u32, tags: &[&str]) -> Vec<ProductRecord> {
    (first..first + count)
        .map(|n| {
            ProductRecord::new(
                format!("gid://shopify/Product/{}", n),
                format!("Product {}", n),
                tags.iter().map(|t| t.to_string()).collect(),
            )
            .with_status(ProductStatus::Active)
        })
        .collect()
}

enum Listing {
    /// Serves the catalog in order; edge cursors are the record positions.
    Catalog(Vec<ProductRecord>),
    /// Replays fixed responses regardless of the cursor.
    Scripted(Mutex<VecDeque<Result<ProductPage, CatalogError>>>),
}

/// Scripted stand-in for the remote catalog that records every call
pub struct FakeCatalog {
    listing: Listing,
    /// Listing request index (0-based) that fails, with the error returned.
    listing_failure: Mutex<Option<(usize, CatalogError)>>,
    rejected_ids: HashSet<String>,
    unreachable_ids: HashSet<String>,
    graphql_error_ids: HashSet<String>,
    listing_requests: Mutex<Vec<Option<PageCursor>>>,
    updates: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeCatalog {
    pub fn with_products(products: Vec<ProductRecord>) -> Self {
        Self::from_listing(Listing::Catalog(products))
    }

    pub fn scripted(pages: Vec<Result<ProductPage, CatalogError>>) -> Self {
        Self::from_listing(Listing::Scripted(Mutex::new(pages.into())))
    }

    fn from_listing(listing: Listing) -> Self {
        Self {
            listing,
            listing_failure: Mutex::new(None),
            rejected_ids: HashSet::new(),
            unreachable_ids: HashSet::new(),
            graphql_error_ids: HashSet::new(),
            listing_requests: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
        }
    }

    /// Makes listing request number `request` (0-based) fail with `error`.
    pub fn failing_listing_at(self, request: usize, error: CatalogError) -> Self {
        *self.listing_failure.lock().unwrap() = Some((request, error));
        self
    }

    /// Answers `productUpdate` for `id` with a validation error.
    pub fn rejecting(mut self, id: impl Into<String>) -> Self {
        self.rejected_ids.insert(id.into());
        self
    }

    /// Answers `productUpdate` for `id` with a transport failure.
    pub fn unreachable_for(mut self, id: impl Into<String>) -> Self {
        self.unreachable_ids.insert(id.into());
        self
    }

    /// Answers `productUpdate` for `id` with a top-level GraphQL `errors` array.
    pub fn graphql_error_for(mut self, id: impl Into<String>) -> Self {
        self.graphql_error_ids.insert(id.into());
        self
    }

    pub fn listing_requests(&self) -> Vec<Option<PageCursor>> {
        self.listing_requests.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<(String, Vec<String>)> {
        self.updates.lock().unwrap().clone()
    }

    fn serve_catalog(products: &[ProductRecord], after: Option<&PageCursor>, page_size: u32) -> ProductPage {
        let start = after
            .and_then(|c| c.as_str().parse::<usize>().ok())
            .map_or(0, |position| position + 1);
        let end = (start + page_size as usize).min(products.len());
        let edges = products
            .get(start..end)
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(offset, product)| ProductEdge {
                cursor: PageCursor::new((start + offset).to_string()),
                product: product.clone(),
            })
            .collect();
        ProductPage {
            edges,
            has_next_page: end < products.len(),
        }
    }
}

#[async_trait]
impl CatalogClient for FakeCatalog {
    async fn fetch_products_page(
        &self,
        after: Option<&PageCursor>,
        page_size: u32,
    ) -> Result<ProductPage, CatalogError> {
        let request = {
            let mut requests = self.listing_requests.lock().unwrap();
            requests.push(after.cloned());
            requests.len() - 1
        };

        {
            let mut failure = self.listing_failure.lock().unwrap();
            if failure.as_ref().is_some_and(|(at, _)| *at == request) {
                if let Some((_, error)) = failure.take() {
                    return Err(error);
                }
            }
        }

        match &self.listing {
            Listing::Catalog(products) => Ok(Self::serve_catalog(products, after, page_size)),
            Listing::Scripted(pages) => pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(ProductPage::default())),
        }
    }

    async fn update_product_tags(
        &self,
        product_id: &str,
        tags: &[String],
    ) -> Result<TagUpdateResult, CatalogError> {
        self.updates
            .lock()
            .unwrap()
            .push((product_id.to_string(), tags.to_vec()));

        if self.unreachable_ids.contains(product_id) {
            return Err(CatalogError::transport("connection reset by peer"));
        }
        if self.graphql_error_ids.contains(product_id) {
            return Err(CatalogError::GraphQl {
                errors: vec![GraphQlError {
                    message: "Throttled".to_string(),
                    extensions: None,
                }],
            });
        }
        if self.rejected_ids.contains(product_id) {
            return Ok(TagUpdateResult {
                product: None,
                user_errors: vec![UserError {
                    field: Some(vec!["tags".to_string()]),
                    message: "Tags is invalid".to_string(),
                }],
            });
        }
        Ok(TagUpdateResult {
            product: Some(ProductRecord::new(product_id, "Updated", tags.to_vec())),
            user_errors: Vec::new(),
        })
    }
}
