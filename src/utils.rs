//! Utility functions

use once_cell::sync::Lazy;
use regex::Regex;

// ============================================================================
// Script Detection
// ============================================================================

/// Check if a character is a CJK ideograph or Japanese kana
pub fn is_cjk_char(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}'   // CJK Unified Ideographs
        | '\u{3400}'..='\u{4DBF}' // Extension A
        | '\u{F900}'..='\u{FAFF}' // Compatibility Ideographs
        | '\u{20000}'..='\u{2EBEF}' // Extensions B-F
        | '\u{30000}'..='\u{323AF}' // Extensions G-H
        | '\u{3040}'..='\u{309F}' // Hiragana
        | '\u{30A0}'..='\u{30FF}' // Katakana
    )
}

/// Check if a string contains any CJK character
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(is_cjk_char)
}

// ============================================================================
// Punctuation
// ============================================================================

static PUNCT_OR_SYMBOL: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\p{P}\p{S}]").unwrap());

static ENGLISH_SENTENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\sA-Za-z0-9_\x{00C0}-\x{024F}]+$").unwrap());

/// CJK punctuation and its ASCII replacement
const CJK_PUNCTUATION_MAP: &[(char, char)] = &[
    ('‘', '\''),
    ('’', '\''),
    ('′', '\''),
    ('“', '"'),
    ('”', '"'),
    ('（', '('),
    ('）', ')'),
    ('，', ','),
    ('！', '!'),
    ('？', '?'),
    ('：', ':'),
];

/// Check if a character is Unicode punctuation or a symbol
pub fn is_punct_or_symbol(c: char) -> bool {
    let mut buf = [0u8; 4];
    PUNCT_OR_SYMBOL.is_match(c.encode_utf8(&mut buf))
}

/// Non-empty and made only of punctuation, symbols and whitespace
pub fn is_only_punct_or_symbol(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_whitespace() || is_punct_or_symbol(c))
}

/// Heuristic for Latin-script lines
///
/// After removing punctuation and symbols, only whitespace, ASCII word
/// characters and Latin-1/Latin Extended letters may remain.
pub fn is_english_sentence(text: &str) -> bool {
    let stripped = PUNCT_OR_SYMBOL.replace_all(text, "");
    ENGLISH_SENTENCE.is_match(&stripped)
}

/// Replace CJK punctuation with ASCII equivalents
pub fn replace_cjk_punctuation(text: &str) -> String {
    text.chars()
        .map(|c| {
            CJK_PUNCTUATION_MAP
                .iter()
                .find(|(from, _)| *from == c)
                .map_or(c, |(_, to)| *to)
        })
        .collect()
}

// ============================================================================
// Similarity
// ============================================================================

/// Levenshtein distance over Unicode code points
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Single rolling row
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diagonal
            } else {
                diagonal.min(above).min(row[j]) + 1
            };
            diagonal = above;
        }
    }
    row[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("", ""), 0);
        assert_eq!(edit_distance("abc", ""), 3);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("Hello world", "Hello world"), 0);
        // Code points, not bytes
        assert_eq!(edit_distance("你好", "你们好"), 1);
    }

    #[test]
    fn test_contains_cjk() {
        assert!(contains_cjk("你"));
        assert!(contains_cjk("abcの"));
        assert!(contains_cjk("カタカナ"));
        assert!(!contains_cjk("Hello"));
        assert!(!contains_cjk("안녕"));
    }

    #[test]
    fn test_is_english_sentence() {
        assert!(is_english_sentence("Don't stop me now!"));
        assert!(is_english_sentence("Café（remix）"));
        assert!(!is_english_sentence("你好 world"));
        assert!(!is_english_sentence(""));
        assert!(!is_english_sentence("..."));
    }

    #[test]
    fn test_replace_cjk_punctuation() {
        assert_eq!(
            replace_cjk_punctuation("“Hey”，you！（ok？）：‘a’"),
            "\"Hey\",you!(ok?):'a'"
        );
    }

    #[test]
    fn test_only_punct() {
        assert!(is_only_punct_or_symbol(" ... "));
        assert!(is_only_punct_or_symbol("，"));
        assert!(!is_only_punct_or_symbol("don't"));
        assert!(!is_only_punct_or_symbol("  "));
    }
}
