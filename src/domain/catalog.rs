//! Remote catalog contract
//!
//! The sync pipeline only talks to the shop through [`CatalogClient`]; the
//! GraphQL implementation lives in `infrastructure::shopify_client`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::product::ProductRecord;

/// Opaque pagination token attached to every listing edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageCursor(String);

impl PageCursor {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PageCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductEdge {
    pub cursor: PageCursor,
    pub product: ProductRecord,
}

/// One page of the product listing
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProductPage {
    pub edges: Vec<ProductEdge>,
    pub has_next_page: bool,
}

impl ProductPage {
    /// Cursor of the last edge on the page, which is where the next page starts.
    pub fn last_cursor(&self) -> Option<&PageCursor> {
        self.edges.last().map(|edge| &edge.cursor)
    }
}

/// Entry of a GraphQL top-level `errors` array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Value>,
}

/// Field-level validation problem reported by a mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

impl std::fmt::Display for UserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.field {
            Some(path) if !path.is_empty() => write!(f, "{}: {}", path.join("."), self.message),
            _ => f.write_str(&self.message),
        }
    }
}

/// Payload of an accepted `productUpdate` call
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagUpdateResult {
    pub product: Option<ProductRecord>,
    pub user_errors: Vec<UserError>,
}

impl TagUpdateResult {
    pub fn is_accepted(&self) -> bool {
        self.user_errors.is_empty()
    }
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Request to catalog failed: {message}")]
    Transport { message: String },

    #[error("Catalog returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Catalog returned GraphQL errors: {}", join_messages(.errors))]
    GraphQl { errors: Vec<GraphQlError> },

    #[error("Failed to decode catalog response: {message}")]
    Decode { message: String },

    #[error("Catalog response is missing {what}")]
    MissingData { what: String },

    #[error("Pagination cursor did not advance after {cursor:?}")]
    StalledCursor { cursor: Option<PageCursor> },
}

impl CatalogError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport {
            message: err.to_string(),
        }
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode {
            message: err.to_string(),
        }
    }

    /// True when the call never produced a usable response body.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::HttpStatus { .. })
    }
}

fn join_messages(errors: &[GraphQlError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Remote catalog operations used by the sync pipeline
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetches one listing page of at most `page_size` products starting after `after`.
    async fn fetch_products_page(
        &self,
        after: Option<&PageCursor>,
        page_size: u32,
    ) -> Result<ProductPage, CatalogError>;

    /// Replaces the product's tag set with `tags`.
    async fn update_product_tags(
        &self,
        product_id: &str,
        tags: &[String],
    ) -> Result<TagUpdateResult, CatalogError>;
}
