use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Recognized slot keys, in clarifying-question priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SlotKey {
    Age,
    HairType,
    Concern,
    /// Who the advice is for; recognized but never asked for explicitly.
    Audience,
}

impl SlotKey {
    /// Slots the dialogue actively tries to fill, highest priority first.
    pub const ASKABLE: [SlotKey; 3] = [SlotKey::Age, SlotKey::HairType, SlotKey::Concern];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotValue {
    pub key: SlotKey,
    pub value: String,
}

/// Age: a one-or-two-digit number adjacent to an age-unit word, either
/// order ("5 سنين", "سنة 5", "3 years old").
fn age_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?x)
            (\d{1,2})\s*(?:سنه|سنين|اعوام|عام|شهور|شهر|years?|yrs?|months?)
            | (?:سنه|عمره|عمرها|age)\s*(\d{1,2})",
        )
        .expect("age pattern is valid")
    })
}

const HAIR_TYPE_VOCAB: [(&str, &str); 7] = [
    ("مجعد", "curly"),
    ("كيرلي", "curly"),
    ("curly", "curly"),
    ("مفرود", "straight"),
    ("ناعم", "straight"),
    ("straight", "straight"),
    ("خشن", "coarse"),
];

const CONCERN_VOCAB: [(&str, &str); 10] = [
    ("هيشان", "frizz"),
    ("هايش", "frizz"),
    ("frizz", "frizz"),
    ("جفاف", "dryness"),
    ("ناشف", "dryness"),
    ("dry", "dryness"),
    ("تقصف", "breakage"),
    ("قشره", "dandruff"),
    ("تساقط", "shedding"),
    ("بيقع", "shedding"),
];

/// Extract slot values from normalized text. Pure; returns zero or more
/// pairs, one per slot key at most.
#[must_use]
pub fn extract_slots(normalized: &str) -> Vec<SlotValue> {
    let mut found = Vec::new();

    if let Some(caps) = age_regex().captures(normalized) {
        if let Some(digits) = caps.get(1).or_else(|| caps.get(2)) {
            found.push(SlotValue {
                key: SlotKey::Age,
                value: digits.as_str().to_string(),
            });
        }
    }

    if let Some((_, canonical)) = HAIR_TYPE_VOCAB
        .iter()
        .find(|(term, _)| normalized.contains(term))
    {
        found.push(SlotValue {
            key: SlotKey::HairType,
            value: (*canonical).to_string(),
        });
    }

    if let Some((_, canonical)) = CONCERN_VOCAB
        .iter()
        .find(|(term, _)| normalized.contains(term))
    {
        found.push(SlotValue {
            key: SlotKey::Concern,
            value: (*canonical).to_string(),
        });
    }

    found
}
