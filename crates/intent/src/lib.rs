//! Intent catalog and fuzzy matcher.
//!
//! A fixed catalog of trigger phrases with structured reply payloads,
//! matched against normalized user text by edit distance. Matching never
//! fails; a message with no record within threshold simply comes back
//! non-confident.

mod catalog;
mod matcher;

pub use catalog::{IntentCatalog, IntentError, IntentRecord, ReplyPayload, Result};
pub use matcher::{IntentMatcher, MatchResult, MatcherConfig};
