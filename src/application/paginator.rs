//! Cursor-driven walk over the catalog listing
//!
//! [`ProductPaginator::pages`] is a lazy stream of listing pages that starts
//! from the beginning every time it is called. [`ProductPaginator::fetch_all`]
//! drives it to completion and decides what to keep.

#![allow(clippy::uninlined_format_args)]

use futures::stream::{self, Stream, StreamExt};
use tracing::{debug, error, info, warn};

use crate::domain::catalog::{CatalogClient, CatalogError, PageCursor, ProductPage};
use crate::domain::pagination::{MAX_PAGE_SIZE, StatusFilter};
use crate::domain::product::ProductRecord;

/// Result of walking the whole listing
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Kept records in listing order
    pub products: Vec<ProductRecord>,
    pub pages_fetched: u32,
    /// Edges dropped by the status filter
    pub filtered_out: u32,
    /// Error that ended the walk early; `products` holds everything collected before it.
    pub interruption: Option<CatalogError>,
}

impl FetchOutcome {
    pub fn is_complete(&self) -> bool {
        self.interruption.is_none()
    }
}

pub struct ProductPaginator<'a, C: CatalogClient + ?Sized> {
    client: &'a C,
    page_size: u32,
    filter: StatusFilter,
}

impl<'a, C: CatalogClient + ?Sized> ProductPaginator<'a, C> {
    /// `page_size` is clamped to `1..=250`.
    pub fn new(client: &'a C, page_size: u32, filter: StatusFilter) -> Self {
        Self {
            client,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            filter,
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Lazily requests pages, one per poll, beginning with no cursor.
    ///
    /// The stream ends after the first error or after a page reporting no
    /// next page. A page that claims a successor but does not move the cursor
    /// yields [`CatalogError::StalledCursor`].
    pub fn pages(&self) -> impl Stream<Item = Result<ProductPage, CatalogError>> + '_ {
        // `None` state ends the stream; `Some(after)` is the next request.
        stream::unfold(Some(None::<PageCursor>), move |state| async move {
            let after = state?;
            let page = match self.client.fetch_products_page(after.as_ref(), self.page_size).await {
                Ok(page) => page,
                Err(e) => return Some((Err(e), None)),
            };

            if !page.has_next_page {
                return Some((Ok(page), None));
            }

            let next = page
                .last_cursor()
                .filter(|cursor| Some(*cursor) != after.as_ref())
                .cloned();
            match next {
                Some(next) => Some((Ok(page), Some(Some(next)))),
                None => Some((Err(CatalogError::StalledCursor { cursor: after }), None)),
            }
        })
    }

    /// Walks every page, keeping records accepted by the status filter.
    ///
    /// A failed page stops the walk; records from earlier pages are kept and
    /// the failure is returned in [`FetchOutcome::interruption`].
    pub async fn fetch_all(&self) -> FetchOutcome {
        let mut outcome = FetchOutcome::default();
        let mut pages = std::pin::pin!(self.pages());

        while let Some(result) = pages.next().await {
            let page = match result {
                Ok(page) => page,
                Err(e) => {
                    error!(
                        "❌ Listing stopped after {} pages ({} products kept): {}",
                        outcome.pages_fetched,
                        outcome.products.len(),
                        e
                    );
                    outcome.interruption = Some(e);
                    break;
                }
            };

            outcome.pages_fetched += 1;
            let edge_count = page.edges.len();
            for edge in page.edges {
                if self.filter.accepts(&edge.product) {
                    outcome.products.push(edge.product);
                } else {
                    outcome.filtered_out += 1;
                }
            }
            debug!(
                "📄 Page {}: {} edges, {} products so far",
                outcome.pages_fetched,
                edge_count,
                outcome.products.len()
            );
        }

        if outcome.filtered_out > 0 {
            info!("⏭️ Skipped {} products that are not ACTIVE", outcome.filtered_out);
        }
        if outcome.is_complete() {
            info!("✅ Total products found: {}", outcome.products.len());
        } else {
            warn!("⚠️ Partial listing, products found: {}", outcome.products.len());
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::ProductEdge;
    use crate::domain::product::ProductStatus;
    use crate::test_utils::{FakeCatalog, active_products};
    use proptest::prelude::*;

    fn edge(cursor: &str, product: ProductRecord) -> ProductEdge {
        ProductEdge {
            cursor: PageCursor::new(cursor),
            product,
        }
    }

    #[tokio::test]
    async fn walks_every_page_in_order() {
        let catalog = FakeCatalog::with_products(active_products(1, 7, &[]));
        let paginator = ProductPaginator::new(&catalog, 3, StatusFilter::ActiveOnly);

        let outcome = paginator.fetch_all().await;

        assert!(outcome.is_complete());
        assert_eq!(outcome.pages_fetched, 3);
        let ids: Vec<_> = outcome.products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids.first(), Some(&"gid://shopify/Product/1"));
        assert_eq!(ids.last(), Some(&"gid://shopify/Product/7"));
        assert_eq!(
            catalog.listing_requests(),
            vec![None, Some(PageCursor::new("2")), Some(PageCursor::new("5"))]
        );
    }

    #[tokio::test]
    async fn empty_first_page_yields_nothing() {
        let catalog = FakeCatalog::with_products(Vec::new());
        let outcome = ProductPaginator::new(&catalog, 250, StatusFilter::ActiveOnly)
            .fetch_all()
            .await;

        assert!(outcome.is_complete());
        assert!(outcome.products.is_empty());
        assert_eq!(outcome.pages_fetched, 1);
        assert_eq!(catalog.listing_requests().len(), 1);
    }

    #[tokio::test]
    async fn failure_keeps_earlier_pages_and_stops_requesting() {
        let catalog = FakeCatalog::with_products(active_products(1, 10, &[]))
            .failing_listing_at(2, CatalogError::transport("connection refused"));
        let outcome = ProductPaginator::new(&catalog, 3, StatusFilter::ActiveOnly)
            .fetch_all()
            .await;

        assert_eq!(outcome.products.len(), 6);
        assert_eq!(outcome.pages_fetched, 2);
        assert!(matches!(outcome.interruption, Some(CatalogError::Transport { .. })));
        // Page 3 failed; page 4 was never asked for.
        assert_eq!(catalog.listing_requests().len(), 3);
    }

    #[tokio::test]
    async fn graphql_errors_end_the_walk() {
        let catalog = FakeCatalog::scripted(vec![Err(CatalogError::GraphQl { errors: Vec::new() })]);
        let outcome = ProductPaginator::new(&catalog, 10, StatusFilter::ActiveOnly)
            .fetch_all()
            .await;

        assert!(outcome.products.is_empty());
        assert!(matches!(outcome.interruption, Some(CatalogError::GraphQl { .. })));
    }

    #[tokio::test]
    async fn graphql_errors_on_a_later_page_keep_earlier_pages() {
        let catalog = FakeCatalog::with_products(active_products(1, 12, &[]))
            .failing_listing_at(2, CatalogError::GraphQl { errors: Vec::new() });
        let outcome = ProductPaginator::new(&catalog, 4, StatusFilter::ActiveOnly)
            .fetch_all()
            .await;

        assert_eq!(outcome.pages_fetched, 2);
        assert_eq!(outcome.products.len(), 8);
        assert_eq!(outcome.products[7].id, "gid://shopify/Product/8");
        assert!(matches!(outcome.interruption, Some(CatalogError::GraphQl { .. })));
        assert_eq!(catalog.listing_requests().len(), 3);
    }

    #[tokio::test]
    async fn cursor_advances_past_filtered_edges() {
        let draft = ProductRecord::new("gid://shopify/Product/2", "Draft", vec![]).with_status(ProductStatus::Draft);
        let active = ProductRecord::new("gid://shopify/Product/1", "Active", vec![]).with_status(ProductStatus::Active);
        let unreported = ProductRecord::new("gid://shopify/Product/3", "No status", vec![]);
        let catalog = FakeCatalog::scripted(vec![
            Ok(ProductPage {
                edges: vec![edge("a", active), edge("b", draft)],
                has_next_page: true,
            }),
            Ok(ProductPage {
                edges: vec![edge("c", unreported)],
                has_next_page: false,
            }),
        ]);

        let outcome = ProductPaginator::new(&catalog, 2, StatusFilter::ActiveOnly)
            .fetch_all()
            .await;

        assert_eq!(outcome.products.len(), 2);
        assert_eq!(outcome.filtered_out, 1);
        assert_eq!(catalog.listing_requests()[1], Some(PageCursor::new("b")));
    }

    #[tokio::test]
    async fn disabled_filter_keeps_every_status() {
        let products = vec![
            ProductRecord::new("gid://shopify/Product/1", "Draft", vec![]).with_status(ProductStatus::Draft),
            ProductRecord::new("gid://shopify/Product/2", "Archived", vec![]).with_status(ProductStatus::Archived),
        ];
        let catalog = FakeCatalog::with_products(products);
        let outcome = ProductPaginator::new(&catalog, 250, StatusFilter::Any).fetch_all().await;
        assert_eq!(outcome.products.len(), 2);
        assert_eq!(outcome.filtered_out, 0);
    }

    #[tokio::test]
    async fn empty_page_claiming_more_is_a_stalled_cursor() {
        let catalog = FakeCatalog::scripted(vec![Ok(ProductPage {
            edges: Vec::new(),
            has_next_page: true,
        })]);
        let outcome = ProductPaginator::new(&catalog, 10, StatusFilter::ActiveOnly)
            .fetch_all()
            .await;

        assert!(matches!(outcome.interruption, Some(CatalogError::StalledCursor { cursor: None })));
        assert_eq!(catalog.listing_requests().len(), 1);
    }

    #[tokio::test]
    async fn repeated_cursor_is_a_stalled_cursor() {
        let product = || ProductRecord::new("gid://shopify/Product/1", "Loop", vec![]);
        let catalog = FakeCatalog::scripted(vec![
            Ok(ProductPage {
                edges: vec![edge("same", product())],
                has_next_page: true,
            }),
            Ok(ProductPage {
                edges: vec![edge("same", product())],
                has_next_page: true,
            }),
        ]);
        let outcome = ProductPaginator::new(&catalog, 10, StatusFilter::ActiveOnly)
            .fetch_all()
            .await;

        assert_eq!(outcome.products.len(), 1);
        assert!(matches!(
            outcome.interruption,
            Some(CatalogError::StalledCursor { cursor: Some(ref c) }) if c.as_str() == "same"
        ));
    }

    #[tokio::test]
    async fn pages_stream_restarts_from_the_beginning() {
        let catalog = FakeCatalog::with_products(active_products(1, 4, &[]));
        let paginator = ProductPaginator::new(&catalog, 2, StatusFilter::ActiveOnly);

        let first: Vec<_> = paginator.pages().take(1).collect().await;
        let all: Vec<_> = paginator.pages().collect().await;

        assert_eq!(first.len(), 1);
        assert_eq!(all.len(), 2);
        assert_eq!(catalog.listing_requests(), vec![None, None, Some(PageCursor::new("1"))]);
    }

    #[test]
    fn page_size_is_clamped() {
        let catalog = FakeCatalog::with_products(Vec::new());
        assert_eq!(ProductPaginator::new(&catalog, 0, StatusFilter::Any).page_size(), 1);
        assert_eq!(ProductPaginator::new(&catalog, 1000, StatusFilter::Any).page_size(), 250);
    }

    proptest! {
        #[test]
        fn converges_to_the_full_listing(total in 0u32..600, page_size in 1u32..=250) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let catalog = FakeCatalog::with_products(active_products(1, total, &["Tack"]));
            let outcome = runtime.block_on(
                ProductPaginator::new(&catalog, page_size, StatusFilter::ActiveOnly).fetch_all(),
            );

            let expected_pages = total.div_ceil(page_size).max(1);
            prop_assert!(outcome.is_complete());
            prop_assert_eq!(outcome.products.len() as u32, total);
            prop_assert_eq!(outcome.pages_fetched, expected_pages);
            prop_assert_eq!(catalog.listing_requests().len() as u32, expected_pages);
            for (index, product) in outcome.products.iter().enumerate() {
                prop_assert_eq!(&product.id, &format!("gid://shopify/Product/{}", index + 1));
            }
        }
    }
}
