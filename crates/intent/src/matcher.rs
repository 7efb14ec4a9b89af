use crate::catalog::{IntentCatalog, IntentRecord};
use kidz_text::normalize;
use serde::Deserialize;

/// Matcher tuning. Distance semantics: 0.0 = identical, 1.0 = unrelated.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// A record is confident when its best distance is at or below this.
    pub threshold: f64,
    /// Additionally require one literal keyword substring hit before
    /// accepting a match. Suppresses false positives from the fuzzy
    /// metric alone.
    pub require_keyword_hit: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            threshold: 0.34,
            require_keyword_hit: false,
        }
    }
}

/// Best intent for one message.
#[derive(Debug, Clone)]
pub struct MatchResult<'a> {
    pub record: Option<&'a IntentRecord>,
    /// Best distance over all of the record's fields, in [0, 1].
    pub score: f64,
    pub confident: bool,
}

impl MatchResult<'_> {
    fn no_match() -> Self {
        MatchResult {
            record: None,
            score: 1.0,
            confident: false,
        }
    }
}

/// Fuzzy matcher over the intent catalog.
///
/// Each record is scored by the best (minimum) normalized Levenshtein
/// distance between the message and the record's trigger, keywords,
/// examples and reply title. The globally best record wins; ties keep the
/// first-registered record.
pub struct IntentMatcher {
    config: MatcherConfig,
}

impl IntentMatcher {
    #[must_use]
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    /// Match normalized text against the catalog. Never fails: an empty
    /// catalog or a message far from every record yields `confident: false`.
    #[must_use]
    pub fn best_match<'a>(&self, normalized: &str, catalog: &'a IntentCatalog) -> MatchResult<'a> {
        if normalized.is_empty() || catalog.is_empty() {
            return MatchResult::no_match();
        }

        let mut best: Option<(&IntentRecord, f64)> = None;
        for record in catalog.records() {
            let score = record_distance(normalized, record);
            // Strict < keeps catalog order on ties.
            if best.map_or(true, |(_, best_score)| score < best_score) {
                best = Some((record, score));
            }
        }

        let Some((record, score)) = best else {
            return MatchResult::no_match();
        };

        let mut confident = score <= self.config.threshold;
        if confident && self.config.require_keyword_hit {
            confident = has_keyword_hit(normalized, record);
        }

        log::debug!(
            "Intent match: trigger='{}' score={score:.3} confident={confident}",
            record.trigger
        );

        MatchResult {
            record: Some(record),
            score,
            confident,
        }
    }
}

/// Best distance over all the record's matchable fields.
fn record_distance(normalized: &str, record: &IntentRecord) -> f64 {
    let fields = std::iter::once(record.trigger.as_str())
        .chain(record.keywords.iter().map(String::as_str))
        .chain(record.examples.iter().map(String::as_str))
        .chain(std::iter::once(record.reply.title.as_str()));

    fields
        .map(|field| field_distance(normalized, field))
        .fold(1.0_f64, f64::min)
}

/// The containment shortcut needs this many characters on the shorter
/// side; below it, stopwords like "في" would score 0.0 against any
/// example containing them.
const MIN_CONTAINMENT_CHARS: usize = 3;

/// Distance between the message and one catalog field, both normalized.
///
/// A literal substring containment in either direction counts as a perfect
/// hit when the contained side is long enough to be meaningful; otherwise
/// fall back to normalized Levenshtein converted to distance.
fn field_distance(normalized: &str, field: &str) -> f64 {
    let field = normalize(field);
    if field.is_empty() {
        return 1.0;
    }
    let shorter = normalized.chars().count().min(field.chars().count());
    if shorter >= MIN_CONTAINMENT_CHARS
        && (normalized.contains(&field) || field.contains(normalized))
    {
        return 0.0;
    }
    1.0 - strsim::normalized_levenshtein(normalized, &field)
}

/// Does the message literally contain one of the record's keywords?
fn has_keyword_hit(normalized: &str, record: &IntentRecord) -> bool {
    record
        .keywords
        .iter()
        .any(|keyword| normalized.contains(&normalize(keyword)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ReplyPayload;
    use pretty_assertions::assert_eq;

    fn record(trigger: &str, keywords: &[&str], examples: &[&str], title: &str) -> IntentRecord {
        IntentRecord {
            trigger: trigger.to_string(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            examples: examples.iter().map(|s| s.to_string()).collect(),
            reply: ReplyPayload {
                title: title.to_string(),
                description: String::new(),
                highlights: vec![],
                image: None,
                gallery: vec![],
            },
        }
    }

    fn catalog() -> IntentCatalog {
        IntentCatalog::new(vec![
            record(
                "offer",
                &["عرض", "عروض", "خصم", "offer", "اسعار"],
                &["في عروض؟", "السعر كام"],
                "عروضنا الحالية",
            ),
            record(
                "safety",
                &["آمن", "امان", "مرخص"],
                &["هل آمن؟", "مرخص من الصحة؟"],
                "السلامة والترخيص",
            ),
        ])
    }

    #[test]
    fn exact_trigger_is_confident() {
        let matcher = IntentMatcher::new(MatcherConfig::default());
        let catalog = catalog();
        let result = matcher.best_match(&normalize("offer"), &catalog);
        assert!(result.confident);
        assert_eq!(result.record.unwrap().trigger, "offer");
        assert!(result.score <= f64::EPSILON);
    }

    #[test]
    fn offers_keyword_family_matches_within_threshold() {
        let matcher = IntentMatcher::new(MatcherConfig::default());
        let catalog = catalog();
        let result = matcher.best_match(&normalize("في عروض؟"), &catalog);
        assert!(result.confident, "score was {}", result.score);
        assert_eq!(result.record.unwrap().trigger, "offer");
        assert!(result.score <= 0.34);
    }

    #[test]
    fn unrelated_text_is_not_confident() {
        let matcher = IntentMatcher::new(MatcherConfig::default());
        let catalog = catalog();
        let result = matcher.best_match(&normalize("عايز اكلم حد من خدمة العملاء حالا"), &catalog);
        assert!(!result.confident);
    }

    #[test]
    fn strict_mode_requires_literal_keyword() {
        let matcher = IntentMatcher::new(MatcherConfig {
            threshold: 0.34,
            require_keyword_hit: true,
        });
        // Close in edit distance to the safety trigger but carries none of
        // its keywords.
        let catalog = catalog();
        let result = matcher.best_match(&normalize("softy"), &catalog);
        assert!(!result.confident);

        let hit = matcher.best_match(&normalize("هل المنتج امان للرضع"), &catalog);
        assert!(hit.confident);
        assert_eq!(hit.record.unwrap().trigger, "safety");
    }

    #[test]
    fn stopword_message_is_not_confident() {
        let matcher = IntentMatcher::new(MatcherConfig::default());
        // "في" is contained in the example "في عروض؟" but is far too short
        // to claim the offers intent.
        let catalog = catalog();
        let result = matcher.best_match(&normalize("في"), &catalog);
        assert!(!result.confident, "score was {}", result.score);
    }

    #[test]
    fn empty_catalog_never_matches() {
        let matcher = IntentMatcher::new(MatcherConfig::default());
        let empty = IntentCatalog::default();
        let result = matcher.best_match("anything", &empty);
        assert!(!result.confident);
        assert!(result.record.is_none());
    }

    #[test]
    fn ties_keep_first_registered_record() {
        let matcher = IntentMatcher::new(MatcherConfig::default());
        let twins = IntentCatalog::new(vec![
            record("first", &["same"], &[], "t"),
            record("second", &["same"], &[], "t"),
        ]);
        let result = matcher.best_match(&normalize("same"), &twins);
        assert_eq!(result.record.unwrap().trigger, "first");
    }
}
