use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IntentError>;

#[derive(Error, Debug)]
pub enum IntentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Structured reply attached to an intent.
///
/// Payload shapes differ per record — some carry a single image, some a
/// gallery, some neither — so every media field is explicitly optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplyPayload {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub gallery: Vec<String>,
}

/// One predefined topic: trigger phrase, matching vocabulary, canned reply.
///
/// Identity is the trigger string; uniqueness within a catalog is the data
/// file's responsibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentRecord {
    pub trigger: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub examples: Vec<String>,
    pub reply: ReplyPayload,
}

/// Immutable intent catalog, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct IntentCatalog {
    records: Vec<IntentRecord>,
}

impl IntentCatalog {
    #[must_use]
    pub fn new(records: Vec<IntentRecord>) -> Self {
        Self { records }
    }

    /// Load the catalog from a JSON array of records.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let records: Vec<IntentRecord> = serde_json::from_slice(&bytes)?;
        log::info!(
            "Loaded {} intent records from {:?}",
            records.len(),
            path.as_ref()
        );
        Ok(Self { records })
    }

    /// Load, degrading to an empty catalog when the file is missing or
    /// corrupt. Matching against an empty catalog yields non-confident
    /// results everywhere.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(catalog) => catalog,
            Err(err) => {
                log::warn!(
                    "Intent catalog unavailable ({err}); running with an empty catalog: {:?}",
                    path.as_ref()
                );
                Self::default()
            }
        }
    }

    #[must_use]
    pub fn records(&self) -> &[IntentRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
