//! Line-synced (LRC) track preprocessing
//!
//! Supports the common `[mm:ss.xx]text` format, including several leading tags
//! on one line. Input without any timestamp falls back to an unsynced lyric.

use super::grammar::{parse_offset, strip_line_tags};
use super::types::{PureLine, PureLyric};

/// Every non-blank line at time 0, for lyrics that carry no timestamps
fn parse_unsynced(src: &str) -> Vec<PureLine> {
    src.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| PureLine::new(0.0, line))
        .collect()
}

/// Preprocess a line-synced track into sorted `{time, lyric}` entries
pub fn preprocess_lrc(src: &str) -> PureLyric {
    let mut lines = Vec::new();

    for line in src.lines() {
        let (timestamps, text) = strip_line_tags(line);
        lines.extend(timestamps.into_iter().map(|time| PureLine::new(time, text)));
    }

    // Stable, so equal times keep source order
    lines.sort_by(|a, b| a.time.total_cmp(&b.time));

    if lines.is_empty() && !src.trim().is_empty() {
        return PureLyric {
            can_auto_scroll: false,
            offset: 0.0,
            lines: parse_unsynced(src),
        };
    }

    PureLyric {
        can_auto_scroll: true,
        offset: parse_offset(src).unwrap_or(0.0),
        lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiple_tags_share_text() {
        let lyric = preprocess_lrc("[00:01.00][00:05.00]hello");
        assert_eq!(lyric.lines.len(), 2);
        assert_eq!(lyric.lines[0], PureLine::new(1000.0, "hello"));
        assert_eq!(lyric.lines[1], PureLine::new(5000.0, "hello"));
    }

    #[test]
    fn test_sorted_across_lines() {
        let lyric = preprocess_lrc("[00:10.00]b\n[00:02.00][00:20.00]a\n[ti:Title]");
        let times: Vec<f64> = lyric.lines.iter().map(|l| l.time).collect();
        assert_eq!(times, vec![2000.0, 10000.0, 20000.0]);
        assert!(lyric.can_auto_scroll);
    }

    #[test]
    fn test_offset_directive() {
        let lyric = preprocess_lrc("[offset:500]\n[00:01.00]a");
        assert_eq!(lyric.offset, 500.0);
        let lyric = preprocess_lrc("[offset:abc]\n[00:01.00]a");
        assert_eq!(lyric.offset, 0.0);
    }

    #[test]
    fn test_unsynced_fallback() {
        let lyric = preprocess_lrc("first line\n\n  second line  \n[offset:300]");
        assert!(!lyric.can_auto_scroll);
        assert_eq!(lyric.offset, 0.0);
        assert_eq!(lyric.lines.len(), 3);
        assert!(lyric.lines.iter().all(|l| l.time == 0.0));
        assert_eq!(lyric.lines[1].lyric, "second line");
    }

    #[test]
    fn test_empty_input() {
        let lyric = preprocess_lrc("   ");
        assert!(lyric.can_auto_scroll);
        assert!(lyric.lines.is_empty());
    }
}
