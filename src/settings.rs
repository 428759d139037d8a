//! Tunable settings for the parser and the player
//!
//! The defaults are empirically tuned heuristics. They can be overridden from a
//! JSON settings file; missing fields keep their defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Secondary tracks sharing fewer timestamps than this ratio with the original
/// are matched by nearest time instead of equal time
pub const CLOSEST_MATCH_RATIO: f64 = 0.1;
/// Two timestamps closer than this count as equal
pub const EQUAL_MATCH_TOLERANCE_MS: f64 = 20.0;
/// Dynamic lines searched on each side of the nearest guess
pub const DYNAMIC_SEARCH_WINDOW: usize = 5;
/// Empty lines followed by a shorter gap are dropped
pub const SILENCE_THRESHOLD_MS: f64 = 5000.0;
/// A first line later than this gets a leading interlude
pub const LEADING_INTERLUDE_THRESHOLD_MS: f64 = 5000.0;
/// Start time of the synthesized leading interlude
pub const LEADING_INTERLUDE_TIME_MS: f64 = 500.0;
/// Minimum duration of a sustained final note
pub const TRAILING_NOTE_MIN_MS: f64 = 1000.0;
/// Default device offset
pub const DEFAULT_OFFSET_MS: f64 = 150.0;
/// Remaining delay below which the timer polls every frame
pub const TIMER_THRESHOLD_MS: f64 = 200.0;

/// All settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub parser: ParserSettings,
    pub player: PlayerSettings,
}

/// Parsing and alignment heuristics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
    pub closest_match_ratio: f64,
    pub equal_match_tolerance_ms: f64,
    pub dynamic_search_window: usize,
    pub silence_threshold_ms: f64,
    pub leading_interlude_threshold_ms: f64,
    pub leading_interlude_time_ms: f64,
    pub trailing_note_min_ms: f64,
    /// Prepend a tip line to timelines that cannot auto-scroll
    pub show_not_support_auto_scroll_tip: bool,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            closest_match_ratio: CLOSEST_MATCH_RATIO,
            equal_match_tolerance_ms: EQUAL_MATCH_TOLERANCE_MS,
            dynamic_search_window: DYNAMIC_SEARCH_WINDOW,
            silence_threshold_ms: SILENCE_THRESHOLD_MS,
            leading_interlude_threshold_ms: LEADING_INTERLUDE_THRESHOLD_MS,
            leading_interlude_time_ms: LEADING_INTERLUDE_TIME_MS,
            trailing_note_min_ms: TRAILING_NOTE_MIN_MS,
            show_not_support_auto_scroll_tip: false,
        }
    }
}

/// Player timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// Device offset (ms), shifts lyrics earlier when positive
    pub offset_ms: f64,
    pub playback_rate: f64,
    pub timer_threshold_ms: f64,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            offset_ms: DEFAULT_OFFSET_MS,
            playback_rate: 1.0,
            timer_threshold_ms: TIMER_THRESHOLD_MS,
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "lyric-timeline", "LyricTimeline")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Load settings from file, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = Self::file_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from_file(&path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Failed to load settings from {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Load settings from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| SettingsError::Io(e.to_string()))?;
        Self::from_json(&content)
    }

    /// Parse settings from JSON text
    pub fn from_json(content: &str) -> Result<Self, SettingsError> {
        serde_json::from_str(content).map_err(|e| SettingsError::Parse(e.to_string()))
    }
}

/// Errors that can occur with settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    Io(String),
    Parse(String),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "IO error: {}", e),
            SettingsError::Parse(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for SettingsError {}
