//! Lyrics parsing module
//!
//! Turns raw lyric tracks into a single time-ordered timeline:
//! - LRC: line-synced original, translation and romanization `[mm:ss.xx]text`
//! - Dynamic: word-synced original `[mm:ss.xx]<offset,duration>word...`
//!
//! When a dynamic track is present the secondary tracks are aligned onto its
//! lines; otherwise the line-synced original is the timeline.

mod align;
mod classify;
mod dynamic;
mod grammar;
mod lrc;
mod postprocess;
mod sync;
mod types;

pub use align::{MatchMode, attach_exact, attach_lyric_to_dynamic, attach_original_lyric, match_mode};
pub use classify::{mark_script, mark_trailing};
pub use dynamic::preprocess_dynamic;
pub use grammar::{WordTag, parse_lyric_time, parse_offset, parse_word_tags, strip_line_tags};
pub use lrc::preprocess_lrc;
pub use postprocess::{fill_durations, merge_same_time, process_lyric};
pub use sync::sync_spaces;
pub use types::*;

use crate::settings::ParserSettings;

/// Inputs shared by the dynamic pipeline stages
struct StageContext<'a> {
    settings: &'a ParserSettings,
    translated: Vec<PureLine>,
    roman: Vec<PureLine>,
}

type Stage = fn(Vec<LyricLine>, &StageContext<'_>) -> Vec<LyricLine>;

fn attach_translated(lines: Vec<LyricLine>, ctx: &StageContext<'_>) -> Vec<LyricLine> {
    attach_lyric_to_dynamic(lines, &ctx.translated, SecondaryField::Translated, ctx.settings)
}

fn attach_roman(lines: Vec<LyricLine>, ctx: &StageContext<'_>) -> Vec<LyricLine> {
    attach_lyric_to_dynamic(lines, &ctx.roman, SecondaryField::Roman, ctx.settings)
}

fn sync_stage(lines: Vec<LyricLine>, _: &StageContext<'_>) -> Vec<LyricLine> {
    sync_spaces(lines)
}

fn script_stage(lines: Vec<LyricLine>, _: &StageContext<'_>) -> Vec<LyricLine> {
    mark_script(lines)
}

fn trailing_stage(lines: Vec<LyricLine>, ctx: &StageContext<'_>) -> Vec<LyricLine> {
    mark_trailing(lines, ctx.settings)
}

fn process_stage(lines: Vec<LyricLine>, ctx: &StageContext<'_>) -> Vec<LyricLine> {
    process_lyric(lines, ctx.settings)
}

fn merge_stage(lines: Vec<LyricLine>, _: &StageContext<'_>) -> Vec<LyricLine> {
    merge_same_time(lines)
}

/// Dynamic pipeline, run in order on the tokenized lines
const DYNAMIC_STAGES: &[(&str, Stage)] = &[
    ("attach translated", attach_translated),
    ("attach roman", attach_roman),
    ("sync spaces", sync_stage),
    ("mark script", script_stage),
    ("mark trailing", trailing_stage),
    ("post-process", process_stage),
    ("merge same time", merge_stage),
];

/// Lyric parser with tunable heuristics
#[derive(Debug, Clone, Default)]
pub struct LyricParser {
    settings: ParserSettings,
}

impl LyricParser {
    pub fn new(settings: ParserSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ParserSettings {
        &self.settings
    }

    /// Parse a set of tracks into a timeline
    pub fn parse(&self, tracks: &LyricTracks) -> LyricInfo {
        if tracks.has_dynamic() {
            self.parse_dynamic(tracks)
        } else {
            self.parse_plain(tracks)
        }
    }

    fn parse_dynamic(&self, tracks: &LyricTracks) -> LyricInfo {
        let original = preprocess_lrc(&tracks.original);
        let ctx = StageContext {
            settings: &self.settings,
            translated: attach_original_lyric(
                preprocess_lrc(&tracks.translated).lines,
                &original.lines,
                &self.settings,
            ),
            roman: attach_original_lyric(
                preprocess_lrc(&tracks.roman).lines,
                &original.lines,
                &self.settings,
            ),
        };

        let mut lines = preprocess_dynamic(&tracks.dynamic);
        let can_auto_scroll = !lines.is_empty() || original.can_auto_scroll;
        tracing::debug!("Parsing dynamic lyric: {} lines", lines.len());

        for (name, stage) in DYNAMIC_STAGES {
            lines = stage(lines, &ctx);
            tracing::trace!("Stage '{}' done: {} lines", name, lines.len());
        }

        LyricInfo {
            lines,
            config: LyricConfig {
                can_auto_scroll,
                is_pure_music: false,
                offset: original.offset,
            },
        }
    }

    fn parse_plain(&self, tracks: &LyricTracks) -> LyricInfo {
        let original = preprocess_lrc(&tracks.original);
        tracing::debug!(
            "Parsing plain lyric: {} lines (synced: {})",
            original.lines.len(),
            original.can_auto_scroll
        );

        let lines: Vec<LyricLine> = original
            .lines
            .iter()
            .map(|line| LyricLine::plain(line.time, line.lyric.as_str()))
            .collect();
        let lines = attach_exact(
            lines,
            &preprocess_lrc(&tracks.translated).lines,
            SecondaryField::Translated,
        );
        let mut lines = attach_exact(lines, &preprocess_lrc(&tracks.roman).lines, SecondaryField::Roman);
        lines.sort_by(|a, b| a.time.total_cmp(&b.time));

        let mut lines = process_lyric(lines, &self.settings);
        if original.can_auto_scroll {
            lines = merge_same_time(lines);
        }
        let mut lines = fill_durations(lines);

        if !original.can_auto_scroll && self.settings.show_not_support_auto_scroll_tip {
            let mut tip = LyricLine::empty();
            tip.config.is_interlude = true;
            tip.config.is_not_support_auto_scroll_tip = true;
            lines.insert(0, tip);
        }

        LyricInfo {
            lines,
            config: LyricConfig {
                can_auto_scroll: original.can_auto_scroll,
                is_pure_music: false,
                offset: original.offset,
            },
        }
    }
}

/// Parse tracks with the default settings
pub fn parse_lyric(tracks: &LyricTracks) -> LyricInfo {
    LyricParser::default().parse(tracks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_offset() {
        let info = parse_lyric(&LyricTracks::original("[offset:500]\n[00:01.00]a\n[00:02.00]b"));
        assert_eq!(info.config.offset, 500.0);
        assert!(info.config.can_auto_scroll);
        assert_eq!(info.lines.len(), 2);
        assert_eq!(info.lines[0].duration, 1000.0);
        assert_eq!(info.lines[1].duration, 0.0);
    }

    #[test]
    fn test_plain_leading_interlude() {
        let info = parse_lyric(&LyricTracks::original("[00:08.00]first\n[00:10.00]second"));
        assert_eq!(info.lines.len(), 3);
        let interlude = &info.lines[0];
        assert_eq!(interlude.time, 500.0);
        assert_eq!(interlude.duration, 7500.0);
        assert_eq!(interlude.content.original, "");
        assert!(interlude.config.is_interlude);
        assert_eq!(info.lines[1].content.original, "first");
    }

    #[test]
    fn test_plain_translation_exact_time() {
        let tracks = LyricTracks {
            original: "[00:01.00]hello\n[00:02.00]world".to_string(),
            translated: "[00:01.00]你好\n[00:02.50]世界".to_string(),
            roman: "[00:02.00]sekai".to_string(),
            ..Default::default()
        };
        let info = parse_lyric(&tracks);
        assert_eq!(info.lines[0].content.translated.as_deref(), Some("你好"));
        assert_eq!(info.lines[1].content.translated, None);
        assert_eq!(info.lines[1].content.roman.as_deref(), Some("sekai"));
    }

    #[test]
    fn test_plain_same_time_merged() {
        let info = parse_lyric(&LyricTracks::original(
            "[00:01.00]a\n[00:01.00]b\n[00:03.00]c",
        ));
        let times: Vec<f64> = info.lines.iter().map(|l| l.time).collect();
        assert_eq!(times, vec![1000.0, 3000.0]);
        assert_eq!(info.lines[0].content.original, "a b");
        assert_eq!(info.lines[0].duration, 2000.0);
    }

    #[test]
    fn test_unsynced_lyric() {
        let info = parse_lyric(&LyricTracks::original("line one\nline two"));
        assert!(!info.config.can_auto_scroll);
        assert_eq!(info.lines.len(), 2);
        assert!(info.lines.iter().all(|l| l.time == 0.0));
    }

    #[test]
    fn test_not_support_auto_scroll_tip() {
        let parser = LyricParser::new(ParserSettings {
            show_not_support_auto_scroll_tip: true,
            ..Default::default()
        });
        let info = parser.parse(&LyricTracks::original("line one\nline two"));
        assert_eq!(info.lines.len(), 3);
        assert!(info.lines[0].config.is_not_support_auto_scroll_tip);
        assert!(info.lines[0].config.is_interlude);

        let synced = parser.parse(&LyricTracks::original("[00:01.00]a"));
        assert!(!synced.lines[0].config.is_not_support_auto_scroll_tip);
    }

    #[test]
    fn test_dynamic_hello_world() {
        let tracks = LyricTracks {
            original: "[10:00.00]Hello world".to_string(),
            dynamic: "[10:00.00]<0,500>Hello<500,300> world".to_string(),
            ..Default::default()
        };
        let info = parse_lyric(&tracks);
        assert!(info.config.can_auto_scroll);
        // Leading interlude before the first line at 10 minutes
        assert_eq!(info.lines.len(), 2);
        assert!(info.lines[0].config.is_interlude);
        assert_eq!(info.lines[0].duration, 599500.0);

        let line = &info.lines[1];
        let words = line.content.words();
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].text, "Hello");
        assert_eq!((words[0].time, words[0].duration), (600000.0, 500.0));
        assert_eq!(words[1].text, " world");
        assert_eq!((words[1].time, words[1].duration), (600500.0, 300.0));
        assert!(words.iter().all(|w| !w.config.need_trailing && !w.config.is_cjk));
    }

    #[test]
    fn test_dynamic_with_translation() {
        let tracks = LyricTracks {
            original: "[00:01.00]Hello world\n[00:03.00]Goodbye".to_string(),
            translated: "[00:01.00]你好世界\n[00:03.00]再见".to_string(),
            dynamic: "[00:01.00]<0,500>Hello<500,300> world\n[00:03.00]<0,1500>Goodbye"
                .to_string(),
            ..Default::default()
        };
        let info = parse_lyric(&tracks);
        assert_eq!(info.lines.len(), 2);
        assert_eq!(info.lines[0].content.translated.as_deref(), Some("你好世界"));
        assert_eq!(info.lines[1].content.translated.as_deref(), Some("再见"));
        assert!(info.lines[1].content.words()[0].config.need_trailing);
    }

    #[test]
    fn test_dynamic_duration_is_word_sum() {
        let tracks = LyricTracks {
            dynamic: "[00:01.00]<0,333>a b c<333,100>d".to_string(),
            ..Default::default()
        };
        let info = parse_lyric(&tracks);
        for line in &info.lines {
            let sum = line.content.words().iter().fold(0.0, |acc, w| acc + w.duration);
            assert_eq!(sum, line.duration);
        }
    }

    #[test]
    fn test_empty_tracks() {
        let info = parse_lyric(&LyricTracks::default());
        assert!(info.is_empty());
    }
}
