//! Timestamp and token grammar
//!
//! - line tag: `[mm:ss.xx]`, `[ss.xx]`, `[mm:ss:xx]`
//! - word tag: `<offset,duration>text`, offset relative to the line
//! - offset directive: `[offset:N]`
//!
//! Everything here is permissive: input that does not match is skipped.

use once_cell::sync::Lazy;
use regex::Regex;

static LINE_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[(?:(?<min>[0-9]+):)?(?<sec>[0-9]+(?:[.:][0-9]+)?)\]").unwrap()
});

static WORD_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<(?<time>[0-9]+),(?<duration>[0-9]+)>(?<word>[^<]*)").unwrap());

static OFFSET: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[offset:(?<value>[0-9]+)\]").unwrap());

/// A word tag before tokenization
#[derive(Debug, Clone, PartialEq)]
pub struct WordTag<'a> {
    /// Offset relative to the line start
    pub offset: f64,
    pub duration: f64,
    pub text: &'a str,
}

/// Convert minute and second fields to milliseconds
///
/// The fraction may use `:` instead of `.`. Unparsable fields count as 0.
pub fn parse_lyric_time(minute: &str, second: &str) -> f64 {
    let min: f64 = minute.parse().unwrap_or(0.0);
    let sec: f64 = second.replace(':', ".").parse().unwrap_or(0.0);
    ((min * 60.0 + sec) * 1000.0).floor()
}

/// Match one line tag at the start of `src`, returning its time and the rest
pub fn split_line_tag(src: &str) -> Option<(f64, &str)> {
    let caps = LINE_TIME.captures(src)?;
    let minute = caps.name("min").map_or("0", |m| m.as_str());
    let second = caps.name("sec").map_or("0", |m| m.as_str());
    let end = caps.get(0)?.end();
    Some((parse_lyric_time(minute, second), &src[end..]))
}

/// Strip every leading line tag from a source line
///
/// Returns the tag times in order and the trimmed remaining text.
pub fn strip_line_tags(line: &str) -> (Vec<f64>, &str) {
    let mut timestamps = Vec::new();
    let mut rest = line.trim();
    while let Some((time, tail)) = split_line_tag(rest) {
        timestamps.push(time);
        rest = tail.trim();
    }
    (timestamps, rest)
}

/// Parse the repeated word tags of a dynamic line body
///
/// Stops at the first position that is not a word tag.
pub fn parse_word_tags(src: &str) -> Vec<WordTag<'_>> {
    let mut words = Vec::new();
    let mut rest = src;
    while !rest.is_empty() {
        let Some(caps) = WORD_TAG.captures(rest) else {
            break;
        };
        let (Some(all), Some(text)) = (caps.get(0), caps.name("word")) else {
            break;
        };
        let offset = caps["time"].parse().unwrap_or(0.0);
        let duration = caps["duration"].parse().unwrap_or(0.0);
        words.push(WordTag {
            offset,
            duration,
            text: text.as_str(),
        });
        rest = &rest[all.end()..];
    }
    words
}

/// Find an `[offset:N]` directive anywhere in the text
pub fn parse_offset(src: &str) -> Option<f64> {
    OFFSET
        .captures(src)
        .and_then(|caps| caps["value"].parse::<f64>().ok())
}
