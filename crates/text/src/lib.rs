//! Arabic-aware text canonicalization shared by every matching component.
//!
//! Matching, vector search and slot extraction all operate on the output of
//! [`normalize`]. The same folding must be applied when the knowledge-base
//! artifact is built offline; a query normalized differently from the index
//! silently misses, so the folding rules live in exactly one place.

use std::collections::BTreeSet;

use unicode_segmentation::UnicodeSegmentation;

/// Arabic combining marks (tashkeel) that carry no lexical identity.
const TASHKEEL: [char; 8] = [
    '\u{064B}', '\u{064C}', '\u{064D}', '\u{064E}', '\u{064F}', '\u{0650}', '\u{0651}', '\u{0652}',
];

/// Tatweel (kashida) — purely typographic stretching.
const TATWEEL: char = '\u{0640}';

/// Canonicalize raw user text for matching.
///
/// Lowercases, strips tashkeel and tatweel, folds Arabic letter-variant
/// families to one representative (alif forms → bare alif, yeh variants →
/// yeh, teh marbuta → heh), collapses whitespace runs and trims. Pure and
/// total; `normalize(normalize(x)) == normalize(x)` for any input.
#[must_use]
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;

    for ch in raw.chars() {
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if ch == TATWEEL || TASHKEEL.contains(&ch) {
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        let folded = fold_letter(ch);
        for lower in folded.to_lowercase() {
            out.push(lower);
        }
    }

    out
}

/// Map each Arabic letter-variant family onto one canonical representative.
fn fold_letter(ch: char) -> char {
    match ch {
        // Alif with hamza/madda/wasla → bare alif
        '\u{0622}' | '\u{0623}' | '\u{0625}' | '\u{0671}' => '\u{0627}',
        // Alif maqsura and yeh-with-hamza → yeh
        '\u{0649}' | '\u{0626}' => '\u{064A}',
        // Teh marbuta → heh
        '\u{0629}' => '\u{0647}',
        // Waw with hamza → waw
        '\u{0624}' => '\u{0648}',
        other => other,
    }
}

/// Split normalized text into word tokens.
///
/// Uses Unicode word boundaries so Arabic script segments correctly; plain
/// `split_whitespace` would glue punctuation onto tokens.
#[must_use]
pub fn tokenize(normalized: &str) -> Vec<String> {
    normalized
        .unicode_words()
        .map(|word| word.to_string())
        .collect()
}

/// Tokens as a set, for overlap scoring.
#[must_use]
pub fn token_set(normalized: &str) -> BTreeSet<String> {
    normalized
        .unicode_words()
        .map(|word| word.to_string())
        .collect()
}

/// Whether the text contains any Arabic-script letter.
///
/// Used to pick the language family for canned replies.
#[must_use]
pub fn contains_arabic(text: &str) -> bool {
    text.chars()
        .any(|ch| ('\u{0600}'..='\u{06FF}').contains(&ch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalize_folds_case_and_trims() {
        assert_eq!(normalize("  Hello   World "), "hello world");
    }

    #[test]
    fn normalize_folds_alif_variants() {
        assert_eq!(normalize("أسعار"), "اسعار");
        assert_eq!(normalize("إسعار"), "اسعار");
        assert_eq!(normalize("آسعار"), "اسعار");
    }

    #[test]
    fn normalize_folds_yeh_and_teh_marbuta() {
        assert_eq!(normalize("مصطفى"), "مصطفي");
        assert_eq!(normalize("جميلة"), "جميله");
    }

    #[test]
    fn normalize_strips_tashkeel() {
        assert_eq!(normalize("شَعْر"), "شعر");
    }

    #[test]
    fn normalize_is_idempotent() {
        let samples = [
            "  Hello   World ",
            "أهلاً وسهلاً",
            "شَعْر طِفْلي مُجَعَّد",
            "في عروض؟",
            "",
            "ـتـمـديـدـ",
        ];
        for raw in samples {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn tokenize_splits_arabic_words() {
        let tokens = tokenize(&normalize("شعر طفلي هايش جدا"));
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0], "شعر");
    }

    #[test]
    fn arabic_detection() {
        assert!(contains_arabic("في عروض؟"));
        assert!(!contains_arabic("any offers?"));
    }
}
