//! Product entities shared by the catalog client, the mirror store and the rules.
//!
//! A [`ProductRecord`] is what the remote catalog returns; a [`MirrorRow`] is the
//! flattened shadow of it kept in the local `products` table.

use serde::{Deserialize, Deserializer, Serialize};

/// Separator used when a tag sequence is flattened into a single column.
pub const TAG_SEPARATOR: char = ',';

/// Publication status reported by the catalog listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    Active,
    Archived,
    Draft,
    #[serde(other)]
    Unknown,
}

/// Product as returned by the remote catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Opaque global id, e.g. `gid://shopify/Product/123`
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    /// Absent when the listing query does not select it
    #[serde(default)]
    pub status: Option<ProductStatus>,
}

impl ProductRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            tags,
            status: None,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: ProductStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Tags joined with [`TAG_SEPARATOR`]; empty string when there are none.
    pub fn flattened_tags(&self) -> String {
        flatten_tags(&self.tags)
    }
}

/// Row of the local `products` mirror table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorRow {
    pub shopify_id: String,
    pub title: String,
    pub tags: String,
}

impl MirrorRow {
    pub fn tag_list(&self) -> Vec<String> {
        split_tags(&self.tags)
    }

    /// Rebuilds the record that will be replayed to the catalog.
    /// Status is not mirrored, so it comes back as `None`.
    pub fn into_record(self) -> ProductRecord {
        let tags = split_tags(&self.tags);
        ProductRecord {
            id: self.shopify_id,
            title: self.title,
            tags,
            status: None,
        }
    }
}

impl From<&ProductRecord> for MirrorRow {
    fn from(record: &ProductRecord) -> Self {
        Self {
            shopify_id: record.id.clone(),
            title: record.title.clone(),
            tags: record.flattened_tags(),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

pub fn flatten_tags(tags: &[String]) -> String {
    tags.join(&TAG_SEPARATOR.to_string())
}

/// Inverse of [`flatten_tags`]. The empty string maps to no tags at all,
/// not to a single empty tag.
pub fn split_tags(flattened: &str) -> Vec<String> {
    if flattened.is_empty() {
        return Vec::new();
    }
    flattened.split(TAG_SEPARATOR).map(str::to_string).collect()
}
