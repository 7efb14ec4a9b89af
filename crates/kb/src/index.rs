use crate::error::Result;
use crate::similarity::cosine_similarity;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Language tag on a knowledge-base record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    Ar,
    En,
    /// Bilingual excerpt (Arabic + English in one text).
    Bi,
    #[default]
    #[serde(other)]
    Unspecified,
}

/// One indexed excerpt: text, language tag, embedding vector, free-form
/// metadata carried through from the build job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbRecord {
    #[serde(default)]
    pub id: String,
    /// Source category from the build job ("faq", "product", …).
    #[serde(default, rename = "type")]
    pub doc_type: String,
    pub text: String,
    #[serde(default)]
    pub lang: Lang,
    #[serde(default)]
    pub vector: Vec<f32>,
    #[serde(default)]
    pub meta: BTreeMap<String, Value>,
}

/// On-disk artifact shape, as written by the offline build job.
#[derive(Debug, Deserialize)]
struct PersistedIndex {
    model: String,
    dims: usize,
    docs: Vec<KbRecord>,
}

/// Search tuning.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub top_k: usize,
    pub min_similarity: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            min_similarity: 0.25,
        }
    }
}

/// A ranked search hit.
#[derive(Debug, Clone)]
pub struct RetrievalHit<'a> {
    pub record: &'a KbRecord,
    pub similarity: f32,
}

/// In-memory knowledge-base index. Immutable after load.
#[derive(Debug, Default)]
pub struct KbIndex {
    model: String,
    dims: usize,
    records: Vec<KbRecord>,
}

impl KbIndex {
    /// Load the precomputed artifact, dropping records whose vector is
    /// missing or disagrees with the declared dimensionality. A dropped
    /// record never partially indexes.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        let persisted: PersistedIndex = serde_json::from_slice(&bytes)?;

        let declared = persisted.docs.len();
        let records: Vec<KbRecord> = persisted
            .docs
            .into_iter()
            .filter(|record| {
                let ok = record.vector.len() == persisted.dims;
                if !ok {
                    log::warn!(
                        "Dropping KB record '{}': vector len {} != dims {}",
                        record.id,
                        record.vector.len(),
                        persisted.dims
                    );
                }
                ok
            })
            .collect();

        log::info!(
            "Loaded KB index: model={} dims={} records={}/{declared}",
            persisted.model,
            persisted.dims,
            records.len()
        );

        Ok(Self {
            model: persisted.model,
            dims: persisted.dims,
            records,
        })
    }

    /// Load, degrading to an empty index on any failure. An empty index
    /// answers every search with no hits; the bot keeps running without
    /// retrieved context.
    pub async fn load_or_empty(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()).await {
            Ok(index) => index,
            Err(err) => {
                log::warn!(
                    "KB index unavailable ({err}); semantic retrieval disabled: {:?}",
                    path.as_ref()
                );
                Self::default()
            }
        }
    }

    /// Nearest neighbors by cosine similarity, descending, ties kept in
    /// load order. Hits below `min_similarity` are dropped; when
    /// `filter_lang` is given, records with a different explicit tag are
    /// dropped (untagged records always pass). Truncated to `top_k`.
    ///
    /// A query whose dimensionality disagrees with the artifact returns no
    /// hits; scoring it over a prefix would rank nonsense.
    #[must_use]
    pub fn search(
        &self,
        query: &[f32],
        filter_lang: Option<Lang>,
        config: SearchConfig,
    ) -> Vec<RetrievalHit<'_>> {
        if self.records.is_empty() {
            return Vec::new();
        }
        if query.len() != self.dims {
            log::warn!(
                "Query vector len {} != index dims {}; returning no hits",
                query.len(),
                self.dims
            );
            return Vec::new();
        }
        let mut hits: Vec<RetrievalHit<'_>> = self
            .records
            .iter()
            .filter(|record| match (filter_lang, record.lang) {
                (Some(_), Lang::Unspecified) | (None, _) => true,
                (Some(wanted), tagged) => wanted == tagged,
            })
            .map(|record| RetrievalHit {
                record,
                similarity: cosine_similarity(query, &record.vector),
            })
            .filter(|hit| hit.similarity >= config.min_similarity)
            .collect();

        // Stable sort preserves load order on equal similarity.
        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(config.top_k);
        hits
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn dims(&self) -> usize {
        self.dims
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
