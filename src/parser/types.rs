//! Lyrics data types
//!
//! Owned, serializable shapes shared by every parser stage and the player.
//! All times are milliseconds.

use serde::{Deserialize, Serialize};

/// Raw input tracks for one song
///
/// Absent tracks are empty strings and contribute nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LyricTracks {
    /// Line-synced original lyric
    pub original: String,
    /// Line-synced translation
    pub translated: String,
    /// Line-synced romanization
    pub roman: String,
    /// Word-synced lyric (`[mm:ss.xx]<offset,duration>word...`)
    pub dynamic: String,
}

impl LyricTracks {
    /// Tracks with only a line-synced original
    pub fn original(original: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            ..Default::default()
        }
    }

    /// Whether the word-synced pipeline applies
    pub fn has_dynamic(&self) -> bool {
        !self.dynamic.trim().is_empty()
    }
}

/// Which secondary field a track feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondaryField {
    Translated,
    Roman,
}

/// Per-word flags filled in by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordConfig {
    /// Word contains CJK ideographs or kana
    pub is_cjk: bool,
    /// Word text ends in whitespace
    pub is_space_end: bool,
    /// Sustained final note of a phrase
    pub need_trailing: bool,
}

/// A single timed word of a dynamic line
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicWord {
    /// Absolute start time
    pub time: f64,
    /// Duration
    pub duration: f64,
    /// The word text, possibly with a leading or trailing space
    pub text: String,
    pub config: WordConfig,
}

impl DynamicWord {
    pub fn new(time: f64, duration: f64, text: impl Into<String>) -> Self {
        Self {
            time,
            duration,
            text: text.into(),
            config: WordConfig::default(),
        }
    }

    /// Blank word, the starting point for builders
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Word-level content of a line
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DynamicContent {
    /// Line start time the word offsets were relative to
    pub time: f64,
    pub words: Vec<DynamicWord>,
}

/// Text carried by a line
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LineContent {
    pub original: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roman: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic: Option<DynamicContent>,
}

impl LineContent {
    /// Secondary field by kind
    pub fn field(&self, field: SecondaryField) -> Option<&String> {
        match field {
            SecondaryField::Translated => self.translated.as_ref(),
            SecondaryField::Roman => self.roman.as_ref(),
        }
    }

    fn field_mut(&mut self, field: SecondaryField) -> &mut Option<String> {
        match field {
            SecondaryField::Translated => &mut self.translated,
            SecondaryField::Roman => &mut self.roman,
        }
    }

    /// Append to a secondary field, space-joined, creating it if absent
    pub fn append_field(&mut self, field: SecondaryField, text: &str) {
        push_joined(self.field_mut(field).get_or_insert_with(String::new), text);
    }

    /// Replace a secondary field
    pub fn set_field(&mut self, field: SecondaryField, text: impl Into<String>) {
        *self.field_mut(field) = Some(text.into());
    }

    /// Dynamic words, empty for plain lines
    pub fn words(&self) -> &[DynamicWord] {
        self.dynamic.as_ref().map(|d| d.words.as_slice()).unwrap_or(&[])
    }
}

/// Line flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineConfig {
    /// Instrumental gap without lyric content
    pub is_interlude: bool,
    /// Placeholder line telling the user the lyric cannot scroll
    pub is_not_support_auto_scroll_tip: bool,
}

/// A single line of the timeline
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LyricLine {
    /// Start time
    pub time: f64,
    /// Time until the next line (0 for the last plain line)
    pub duration: f64,
    pub content: LineContent,
    pub config: LineConfig,
}

impl LyricLine {
    /// Plain line with only original text
    pub fn plain(time: f64, original: impl Into<String>) -> Self {
        Self {
            time,
            content: LineContent {
                original: original.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Empty line at time 0
    pub fn empty() -> Self {
        Self::default()
    }

    /// Synthesized instrumental line
    pub fn interlude(time: f64, duration: f64) -> Self {
        Self {
            time,
            duration,
            content: LineContent::default(),
            config: LineConfig {
                is_interlude: true,
                is_not_support_auto_scroll_tip: false,
            },
        }
    }
}

/// Timeline-level flags
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricConfig {
    /// Source carried timestamps; false for free text
    pub can_auto_scroll: bool,
    pub is_pure_music: bool,
    /// Global offset from `[offset:N]`
    pub offset: f64,
}

/// Parsed timeline
///
/// `LyricInfo::default()` is the empty timeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LyricInfo {
    pub lines: Vec<LyricLine>,
    pub config: LyricConfig,
}

impl LyricInfo {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// A preprocessed line-synced entry
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PureLine {
    pub time: f64,
    pub lyric: String,
    /// Plain original text matched onto this entry by the aligner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_lyric: Option<String>,
}

impl PureLine {
    pub fn new(time: f64, lyric: impl Into<String>) -> Self {
        Self {
            time,
            lyric: lyric.into(),
            original_lyric: None,
        }
    }
}

/// Result of preprocessing one line-synced track
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PureLyric {
    pub can_auto_scroll: bool,
    pub offset: f64,
    pub lines: Vec<PureLine>,
}

/// Append `text` to `target`, separated by a space when `target` is non-empty
pub(crate) fn push_joined(target: &mut String, text: &str) {
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(text);
}
