//! Listing pagination rules.

use crate::domain::product::{ProductRecord, ProductStatus};

/// Largest page the Admin API accepts for `products(first:)`.
pub const MAX_PAGE_SIZE: u32 = 250;

/// Which listing edges are kept by the paginator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    /// Keep ACTIVE products and products whose status was not reported.
    #[default]
    ActiveOnly,
    /// Keep every edge.
    Any,
}

impl StatusFilter {
    pub fn from_active_only(active_only: bool) -> Self {
        if active_only { Self::ActiveOnly } else { Self::Any }
    }

    pub fn accepts(self, product: &ProductRecord) -> bool {
        match self {
            Self::Any => true,
            Self::ActiveOnly => matches!(product.status, None | Some(ProductStatus::Active)),
        }
    }
}
