//! Application layer module
//!
//! The four sync stages and the pipeline that runs them in order.

pub mod paginator;
pub mod sync_pipeline;
pub mod tag_rules;
pub mod write_back;

// Re-export commonly used items
pub use paginator::{FetchOutcome, ProductPaginator};
pub use sync_pipeline::{SyncOptions, SyncPipeline, SyncSummary};
pub use tag_rules::TagRuleEngine;
pub use write_back::{TagUpdateOutcome, WriteBackDriver, WriteBackFailure, WriteBackReport, WriteMode};
