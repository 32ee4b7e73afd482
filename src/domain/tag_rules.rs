//! Tag rules applied to the mirrored snapshot.
//!
//! The store evaluates these in SQL; the methods here define the exact
//! semantics the SQL has to reproduce.

use serde::{Deserialize, Serialize};

use crate::domain::product::TAG_SEPARATOR;

/// Deletes rows whose flattened tag string contains any of the substrings.
///
/// Matching is a case-sensitive literal substring test over the whole
/// comma-joined string, not a per-tag comparison: `"Outlet"` also matches
/// `"Outlet2000"` and `"Gear"` matches `"Premier Gear Strap"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionRule {
    pub substrings: Vec<String>,
}

impl ExclusionRule {
    pub fn new<I, S>(substrings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            substrings: substrings.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.substrings.is_empty()
    }

    pub fn matches(&self, flattened_tags: &str) -> bool {
        self.substrings
            .iter()
            .any(|needle| flattened_tags.contains(needle.as_str()))
    }
}

/// Appends one tag to every row, without checking whether it is already there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AugmentationRule {
    pub tag: String,
}

impl AugmentationRule {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    pub fn apply(&self, flattened_tags: &str) -> String {
        if flattened_tags.is_empty() {
            self.tag.clone()
        } else {
            format!("{flattened_tags}{TAG_SEPARATOR}{}", self.tag)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExclusionSummary {
    pub removed: u64,
    pub remaining: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AugmentationSummary {
    pub updated: u64,
}
