//! Line post-processing
//!
//! Removes short instrumental gaps, adds a leading interlude for long intros,
//! flags interludes and normalizes punctuation in Latin-script lines.

use super::types::{DynamicWord, LyricLine, push_joined};
use crate::settings::ParserSettings;
use crate::utils::{is_english_sentence, replace_cjk_punctuation};

/// Keep at most one empty line per run, and only before a long gap
fn collapse_silences(lines: Vec<LyricLine>, threshold: f64) -> Vec<LyricLine> {
    let next_times: Vec<Option<f64>> = lines
        .iter()
        .skip(1)
        .map(|l| Some(l.time))
        .chain(std::iter::once(None))
        .collect();

    let mut result = Vec::with_capacity(lines.len());
    let mut in_silence = false;
    for (line, next_time) in lines.into_iter().zip(next_times) {
        if line.content.original.trim().is_empty() {
            let long_gap = next_time.is_some_and(|next| next - line.time >= threshold);
            if long_gap && !in_silence {
                result.push(line);
                in_silence = true;
            }
        } else {
            in_silence = false;
            result.push(line);
        }
    }
    result
}

fn insert_leading_interlude(mut lines: Vec<LyricLine>, settings: &ParserSettings) -> Vec<LyricLine> {
    let start = lines
        .iter()
        .position(|l| !l.content.original.is_empty())
        .unwrap_or(lines.len());
    lines.drain(..start);

    if let Some(first) = lines.first() {
        if first.time > settings.leading_interlude_threshold_ms {
            let time = settings.leading_interlude_time_ms;
            lines.insert(0, LyricLine::interlude(time, first.time - time));
        }
    }
    lines
}

fn mark_interludes(mut lines: Vec<LyricLine>) -> Vec<LyricLine> {
    for line in &mut lines {
        if line.content.original.is_empty() {
            line.config.is_interlude = true;
        }
    }
    lines
}

/// Replace CJK punctuation in lines that are otherwise Latin script
fn normalize_punctuation(mut lines: Vec<LyricLine>) -> Vec<LyricLine> {
    for line in &mut lines {
        if !is_english_sentence(&line.content.original) {
            continue;
        }
        if let Some(dynamic) = line.content.dynamic.as_mut() {
            for word in &mut dynamic.words {
                word.text = replace_cjk_punctuation(&word.text);
            }
        }
        line.content.original = replace_cjk_punctuation(&line.content.original);
    }
    lines
}

/// Post-process parsed lines
pub fn process_lyric(lines: Vec<LyricLine>, settings: &ParserSettings) -> Vec<LyricLine> {
    let lines = collapse_silences(lines, settings.silence_threshold_ms);
    let lines = insert_leading_interlude(lines, settings);
    let lines = mark_interludes(lines);
    normalize_punctuation(lines)
}

fn merge_optional(target: &mut Option<String>, other: Option<String>) {
    if let Some(text) = other {
        push_joined(target.get_or_insert_with(String::new), &text);
    }
}

/// Merge lines that share a timestamp into the first of them
///
/// Only meaningful for synced timelines; unsynced lines all sit at 0.
pub fn merge_same_time(lines: Vec<LyricLine>) -> Vec<LyricLine> {
    let mut result: Vec<LyricLine> = Vec::with_capacity(lines.len());
    for line in lines {
        let Some(last) = result.last_mut().filter(|last| last.time == line.time) else {
            result.push(line);
            continue;
        };

        let content = line.content;
        if !content.original.is_empty() {
            push_joined(&mut last.content.original, &content.original);
        }
        merge_optional(&mut last.content.translated, content.translated);
        merge_optional(&mut last.content.roman, content.roman);
        if let Some(dynamic) = content.dynamic {
            match last.content.dynamic.as_mut() {
                Some(existing) => merge_words(&mut existing.words, dynamic.words),
                None => last.content.dynamic = Some(dynamic),
            }
        }
        last.duration += line.duration;
        last.config.is_interlude = last.content.original.is_empty();
    }
    result
}

/// Append `words` keeping word times non-decreasing
///
/// A space separates the two runs unless one side already carries it.
fn merge_words(existing: &mut Vec<DynamicWord>, words: Vec<DynamicWord>) {
    let needs_space = words
        .first()
        .is_some_and(|w| !w.text.starts_with(char::is_whitespace));
    if let Some(last) = existing.last_mut().filter(|_| needs_space) {
        if !last.text.ends_with(char::is_whitespace) {
            last.text.push(' ');
        }
    }
    existing.extend(words);
    existing.sort_by(|a, b| a.time.total_cmp(&b.time));
}

/// Plain lines last until the next line; the last line keeps 0
pub fn fill_durations(mut lines: Vec<LyricLine>) -> Vec<LyricLine> {
    for i in 1..lines.len() {
        lines[i - 1].duration = lines[i].time - lines[i - 1].time;
    }
    lines
}
