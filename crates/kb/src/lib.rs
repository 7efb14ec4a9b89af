//! Knowledge-base index: precomputed text+vector records with cosine
//! nearest-neighbor lookup.
//!
//! The artifact is produced offline by a batch embedding job and consumed
//! read-only here. After load the index is immutable and freely shareable
//! across concurrent turns; `search` takes `&self` and never mutates.

mod error;
mod index;
mod similarity;

pub use error::{KbError, Result};
pub use index::{KbIndex, KbRecord, Lang, RetrievalHit, SearchConfig};
pub use similarity::cosine_similarity;
