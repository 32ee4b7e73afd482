//! Shared fixtures for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

use shopify_tag_sync_lib::domain::{
    CatalogClient, CatalogError, PageCursor, ProductEdge, ProductPage, ProductRecord, ProductStatus,
    TagUpdateResult, UserError,
};

/// In-memory shop serving its products in pages; edge cursors are positions.
pub struct InMemoryShop {
    products: Vec<ProductRecord>,
    rejected: HashSet<String>,
    pub listing_calls: Mutex<u32>,
    pub mutations: Mutex<Vec<(String, Vec<String>)>>,
}

impl InMemoryShop {
    pub fn new(products: Vec<ProductRecord>) -> Self {
        Self {
            products,
            rejected: HashSet::new(),
            listing_calls: Mutex::new(0),
            mutations: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting(mut self, ids: &[&str]) -> Self {
        self.rejected.extend(ids.iter().map(|id| id.to_string()));
        self
    }

    pub fn mutation_count(&self) -> usize {
        self.mutations.lock().unwrap().len()
    }
}

#[async_trait]
impl CatalogClient for InMemoryShop {
    async fn fetch_products_page(
        &self,
        after: Option<&PageCursor>,
        page_size: u32,
    ) -> Result<ProductPage, CatalogError> {
        *self.listing_calls.lock().unwrap() += 1;
        let start = after.map_or(0, |c| c.as_str().parse::<usize>().unwrap() + 1);
        let end = (start + page_size as usize).min(self.products.len());
        let edges = (start..end)
            .map(|i| ProductEdge {
                cursor: PageCursor::new(i.to_string()),
                product: self.products[i].clone(),
            })
            .collect();
        Ok(ProductPage {
            edges,
            has_next_page: end < self.products.len(),
        })
    }

    async fn update_product_tags(
        &self,
        product_id: &str,
        tags: &[String],
    ) -> Result<TagUpdateResult, CatalogError> {
        self.mutations
            .lock()
            .unwrap()
            .push((product_id.to_string(), tags.to_vec()));
        let user_errors = if self.rejected.contains(product_id) {
            vec![UserError {
                field: Some(vec!["tags".to_string()]),
                message: "Tag is too long".to_string(),
            }]
        } else {
            Vec::new()
        };
        Ok(TagUpdateResult {
            product: None,
            user_errors,
        })
    }
}

pub fn product(n: usize, tags: &[&str], status: ProductStatus) -> ProductRecord {
    ProductRecord::new(
        format!("gid://shopify/Product/{}", n),
        format!("Saddle Pad {}", n),
        tags.iter().map(|t| t.to_string()).collect(),
    )
    .with_status(status)
}
