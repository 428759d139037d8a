//! Word boundary synchronization
//!
//! Word tags cannot always carry the spaces between words. The original line
//! text is replayed against the words and lost spaces are appended back.

use super::types::{DynamicWord, LyricLine};

/// Reinsert spaces into one line's words, stopping where they diverge
fn sync_words(raw: &str, words: &mut [DynamicWord]) {
    let mut rest = raw.trim();

    for j in 0..words.len() {
        let word = words[j].text.trim_end();
        let Some(tail) = rest.strip_prefix(word) else {
            break;
        };
        rest = tail;

        let after = rest.trim_start();
        if after.len() == rest.len() {
            continue;
        }
        // A following word that starts with whitespace owns it
        let next_owns_space = words
            .get(j + 1)
            .is_some_and(|next| next.text.starts_with(char::is_whitespace));
        if next_owns_space {
            continue;
        }
        rest = after;
        if !words[j].text.ends_with(char::is_whitespace) {
            words[j].text.push(' ');
        }
    }
}

/// Sync spaces from each line's original text into its words
pub fn sync_spaces(mut lines: Vec<LyricLine>) -> Vec<LyricLine> {
    for line in &mut lines {
        let raw = line.content.original.clone();
        if let Some(dynamic) = line.content.dynamic.as_mut() {
            sync_words(&raw, &mut dynamic.words);
        }
    }
    lines
}
