//! Word-synced (dynamic) lyric tokenizer
//!
//! Format: `[mm:ss.xx]<offset,duration>word<offset,duration>word...`
//! where each word offset is relative to the line timestamp.

use super::grammar::{WordTag, parse_word_tags, split_line_tag};
use super::types::{DynamicContent, DynamicWord, LineContent, LyricLine};

/// Split a word tag wrapping several space-separated words
///
/// The duration is divided evenly. A leading space of the source goes to the
/// first sub-word and a trailing space to the last; middle sub-words always
/// end in a space.
fn split_word(start: f64, tag: &WordTag<'_>) -> Vec<DynamicWord> {
    let parts: Vec<&str> = tag.text.split_whitespace().collect();
    let count = parts.len();
    let duration = tag.duration / count as f64;
    let leading = tag.text.starts_with(char::is_whitespace);
    let trailing = tag.text.ends_with(char::is_whitespace);

    parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            let first = i == 0;
            let last = i + 1 == count;
            let mut text = String::with_capacity(part.len() + 2);
            if first && leading {
                text.push(' ');
            }
            text.push_str(part);
            if (last && trailing) || (!first && !last) {
                text.push(' ');
            }
            DynamicWord::new(start + i as f64 * duration, duration, text)
        })
        .collect()
}

/// Tokenize the body of one dynamic line
fn parse_words(line_time: f64, body: &str) -> Vec<DynamicWord> {
    let mut words: Vec<DynamicWord> = Vec::new();

    for tag in parse_word_tags(body) {
        if tag.text.is_empty() {
            continue;
        }
        // A whitespace-only word is the gap after the previous word
        if tag.text.trim().is_empty() {
            if let Some(last) = words.last_mut() {
                last.text.push(' ');
            }
            continue;
        }
        words.extend(split_word(line_time + tag.offset, &tag));
    }

    words
}

/// Parse a single dynamic line
fn parse_line(line: &str) -> Option<LyricLine> {
    let (time, body) = split_line_tag(line.trim())?;
    let words = parse_words(time, body);

    Some(LyricLine {
        time,
        duration: words.iter().fold(0.0, |acc, w| acc + w.duration),
        content: LineContent {
            original: words.iter().map(|w| w.text.as_str()).collect(),
            dynamic: Some(DynamicContent { time, words }),
            ..Default::default()
        },
        ..Default::default()
    })
}

/// Tokenize a word-synced track into lines sorted by time
pub fn preprocess_dynamic(src: &str) -> Vec<LyricLine> {
    let mut result: Vec<LyricLine> = src.trim().lines().filter_map(parse_line).collect();
    result.sort_by(|a, b| a.time.total_cmp(&b.time));
    result
}
