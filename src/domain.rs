//! Domain module - Core entities and contracts
//!
//! Product records, tag rules and the two seams the pipeline talks through:
//! the remote catalog and the local mirror.

pub mod catalog;
pub mod pagination;
pub mod product;
pub mod repositories;
pub mod tag_rules;

// Re-export commonly used items
pub use catalog::{CatalogClient, CatalogError, PageCursor, ProductEdge, ProductPage, TagUpdateResult, UserError};
pub use pagination::{MAX_PAGE_SIZE, StatusFilter};
pub use product::{MirrorRow, ProductRecord, ProductStatus};
pub use repositories::ProductMirrorRepository;
pub use tag_rules::{AugmentationRule, AugmentationSummary, ExclusionRule, ExclusionSummary};
