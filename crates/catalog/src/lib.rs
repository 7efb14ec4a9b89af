//! Product catalog with token-overlap ranking.
//!
//! A lightweight keyword scorer over a small catalog, used when the vector
//! index has nothing confident to offer or as supplementary context. Pure:
//! an empty catalog simply ranks to an empty list.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One product. Every descriptive field beyond the name is optional; the
/// data file grows without code changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub notes: String,
}

impl CatalogItem {
    /// All searchable text, normalized, concatenated with spaces.
    fn haystack(&self) -> String {
        let mut parts = vec![self.name.clone(), self.description.clone(), self.notes.clone()];
        parts.extend(self.tags.iter().cloned());
        parts.extend(self.benefits.iter().cloned());
        parts.extend(self.ingredients.iter().cloned());
        kidz_text::normalize(&parts.join(" "))
    }
}

/// Immutable product catalog, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct ProductCatalog {
    items: Vec<CatalogItem>,
}

/// Domain keyword families that earn a fixed additive boost when both the
/// query and the item mention them.
const HAIR_FAMILY: [&str; 6] = ["شعر", "hair", "شامبو", "shampoo", "ليف", "cream"];
const CHILD_FAMILY: [&str; 6] = ["طفل", "اطفال", "طفلي", "kids", "children", "baby"];

impl ProductCatalog {
    #[must_use]
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self { items }
    }

    /// Load the catalog from a JSON array of items.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let items: Vec<CatalogItem> = serde_json::from_slice(&bytes)?;
        log::info!(
            "Loaded {} catalog items from {:?}",
            items.len(),
            path.as_ref()
        );
        Ok(Self { items })
    }

    /// Load, degrading to an empty catalog when the file is missing or
    /// corrupt.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(catalog) => catalog,
            Err(err) => {
                log::warn!(
                    "Product catalog unavailable ({err}); running with an empty catalog: {:?}",
                    path.as_ref()
                );
                Self::default()
            }
        }
    }

    /// Rank items by how many query tokens appear as substrings of the
    /// item's searchable text, with fixed boosts for the hair and children
    /// keyword families. Descending score, stable on ties (catalog order).
    #[must_use]
    pub fn rank(&self, query_tokens: &BTreeSet<String>, limit: usize) -> Vec<&CatalogItem> {
        let mut scored: Vec<(usize, &CatalogItem)> = self
            .items
            .iter()
            .filter_map(|item| {
                let haystack = item.haystack();
                let mut score = query_tokens
                    .iter()
                    .filter(|token| haystack.contains(token.as_str()))
                    .count();
                if score == 0 {
                    return None;
                }
                if HAIR_FAMILY.iter().any(|kw| haystack.contains(kw)) {
                    score += 2;
                }
                if CHILD_FAMILY.iter().any(|kw| haystack.contains(kw)) {
                    score += 1;
                }
                Some((score, item))
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().take(limit).map(|(_, item)| item).collect()
    }

    #[must_use]
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
