//! Shopify Admin GraphQL client
//!
//! Implements [`CatalogClient`] over `POST {shop}/admin/api/{version}/graphql.json`.
//! Each call is a single round trip; retries are deliberately absent, a failed
//! call is reported to the caller which decides whether to stop or move on.

#![allow(clippy::uninlined_format_args)]

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, error};

use crate::domain::catalog::{
    CatalogClient, CatalogError, GraphQlError, PageCursor, ProductEdge, ProductPage,
    TagUpdateResult, UserError,
};
use crate::domain::product::ProductRecord;
use crate::infrastructure::config::{AppConfig, ConfigError, shopify};

const PRODUCTS_QUERY: &str = r#"
query Products($first: Int!, $after: String) {
    products(first: $first, after: $after) {
        edges {
            cursor
            node {
                id
                title
                tags
                status
            }
        }
        pageInfo {
            hasNextPage
        }
    }
}
"#;

const PRODUCT_UPDATE_MUTATION: &str = r#"
mutation productUpdate($input: ProductInput!) {
    productUpdate(input: $input) {
        product {
            id
            title
            tags
            status
        }
        userErrors {
            field
            message
        }
    }
}
"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct ProductsData {
    products: ProductConnection,
}

#[derive(Debug, Deserialize)]
struct ProductConnection {
    #[serde(default)]
    edges: Vec<WireEdge>,
    #[serde(rename = "pageInfo")]
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
struct WireEdge {
    cursor: String,
    node: ProductRecord,
}

#[derive(Debug, Deserialize)]
struct PageInfo {
    #[serde(rename = "hasNextPage")]
    has_next_page: bool,
}

#[derive(Debug, Deserialize)]
struct ProductUpdateData {
    #[serde(rename = "productUpdate")]
    product_update: Option<ProductUpdatePayload>,
}

#[derive(Debug, Deserialize)]
struct ProductUpdatePayload {
    product: Option<ProductRecord>,
    #[serde(rename = "userErrors", default)]
    user_errors: Vec<UserError>,
}

/// Unwraps `data`, turning a non-empty `errors` array into [`CatalogError::GraphQl`].
fn into_data<T: DeserializeOwned>(body: Value) -> Result<T, CatalogError> {
    let response: GraphQlResponse<T> = serde_json::from_value(body).map_err(CatalogError::decode)?;
    if let Some(errors) = response.errors.filter(|errors| !errors.is_empty()) {
        return Err(CatalogError::GraphQl { errors });
    }
    response.data.ok_or_else(|| CatalogError::MissingData {
        what: "data".to_string(),
    })
}

pub(crate) fn parse_products_page(body: Value) -> Result<ProductPage, CatalogError> {
    let data: ProductsData = into_data(body)?;
    let edges = data
        .products
        .edges
        .into_iter()
        .map(|edge| ProductEdge {
            cursor: PageCursor::new(edge.cursor),
            product: edge.node,
        })
        .collect();
    Ok(ProductPage {
        edges,
        has_next_page: data.products.page_info.has_next_page,
    })
}

pub(crate) fn parse_tag_update(body: Value) -> Result<TagUpdateResult, CatalogError> {
    let data: ProductUpdateData = into_data(body)?;
    let payload = data.product_update.ok_or_else(|| CatalogError::MissingData {
        what: "productUpdate".to_string(),
    })?;
    Ok(TagUpdateResult {
        product: payload.product,
        user_errors: payload.user_errors,
    })
}

/// GraphQL client bound to one shop
#[derive(Clone)]
pub struct ShopifyClient {
    client: Client,
    endpoint: url::Url,
}

impl ShopifyClient {
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let endpoint = config.graphql_endpoint()?;

        let mut token = header::HeaderValue::from_str(&config.access_token)
            .map_err(|e| ConfigError::validation(format!("access_token is not a valid header value: {}", e)))?;
        token.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(shopify::ACCESS_TOKEN_HEADER, token);

        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(concat!("shopify-tag-sync/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .gzip(true)
            .build()
            .map_err(|e| ConfigError::validation(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }

    /// Posts one GraphQL document and returns the decoded JSON body.
    async fn post(&self, query: &str, variables: Value) -> Result<Value, CatalogError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(CatalogError::transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("❌ HTTP error {} from {}", status, self.endpoint);
            return Err(CatalogError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        response.json::<Value>().await.map_err(CatalogError::decode)
    }
}

#[async_trait]
impl CatalogClient for ShopifyClient {
    async fn fetch_products_page(
        &self,
        after: Option<&PageCursor>,
        page_size: u32,
    ) -> Result<ProductPage, CatalogError> {
        debug!("🌐 Fetching products page after {:?}", after.map(PageCursor::as_str));
        let variables = json!({
            "first": page_size,
            "after": after.map(PageCursor::as_str),
        });
        let body = self.post(PRODUCTS_QUERY, variables).await?;
        parse_products_page(body)
    }

    async fn update_product_tags(
        &self,
        product_id: &str,
        tags: &[String],
    ) -> Result<TagUpdateResult, CatalogError> {
        debug!("🌐 productUpdate {} tags={:?}", product_id, tags);
        let variables = json!({
            "input": {
                "id": product_id,
                "tags": tags,
            }
        });
        let body = self.post(PRODUCT_UPDATE_MUTATION, variables).await?;
        parse_tag_update(body)
    }
}
