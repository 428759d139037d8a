//! Script and trailing-note classification
//!
//! Marks CJK and space-ending words, then finds the sustained final note of
//! each phrase so a renderer can stretch it.

use once_cell::sync::Lazy;
use regex::Regex;

use super::types::{DynamicWord, LyricLine};
use crate::settings::ParserSettings;
use crate::utils::{contains_cjk, is_only_punct_or_symbol};

/// Phrase-ending punctuation
static SYMBOL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,.，。!?？、；：…—~～·‘’“”ﾞ]").unwrap());

static ENGLISH_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-zA-Z]+").unwrap());

/// Set `is_cjk` and `is_space_end` on every word
pub fn mark_script(mut lines: Vec<LyricLine>) -> Vec<LyricLine> {
    for line in &mut lines {
        let Some(dynamic) = line.content.dynamic.as_mut() else {
            continue;
        };
        for word in &mut dynamic.words {
            word.config.is_cjk = contains_cjk(&word.text);
            word.config.is_space_end = word.text.ends_with(char::is_whitespace);
        }
    }
    lines
}

/// Indexes after which a new phrase starts
///
/// Latin words never end a phrase here, so contractions like "don't" stay
/// whole.
fn phrase_boundaries(words: &[DynamicWord]) -> Vec<usize> {
    let last = words.len().saturating_sub(1);
    words[..last]
        .iter()
        .enumerate()
        .filter(|(_, word)| word.config.is_space_end || SYMBOL.is_match(&word.text))
        .filter(|(_, word)| !ENGLISH_WORD.is_match(&word.text))
        .map(|(j, _)| j)
        .collect()
}

fn mark_trailing_words(words: &mut [DynamicWord], min_duration: f64) {
    if words.is_empty() {
        return;
    }

    // Segment ends; each segment runs from the previous end (exclusive)
    let mut ends = phrase_boundaries(words);
    ends.push(words.len() - 1);

    let mut start = 0;
    for end in ends {
        let candidate = (start..=end).rev().find(|&k| {
            let text = words[k].text.trim();
            !text.is_empty() && !is_only_punct_or_symbol(text)
        });
        if let Some(k) = candidate {
            if words[k].duration >= min_duration {
                words[k].config.need_trailing = true;
            }
        }
        start = end + 1;
    }
}

/// Mark the sustained last note of every phrase
pub fn mark_trailing(mut lines: Vec<LyricLine>, settings: &ParserSettings) -> Vec<LyricLine> {
    for line in &mut lines {
        if let Some(dynamic) = line.content.dynamic.as_mut() {
            mark_trailing_words(&mut dynamic.words, settings.trailing_note_min_ms);
        }
    }
    lines
}
