//! Lyric timeline - parse timestamped lyrics and schedule their lines
//!
//! - `parser`: line-synced and word-synced parsing, track alignment and annotation
//! - `player`: clock-anchored line scheduler with drift correction
//! - `settings`: tunable heuristics, loadable from JSON

pub mod parser;
pub mod player;
pub mod settings;
pub mod utils;

pub use parser::{LyricInfo, LyricLine, LyricParser, LyricTracks, parse_lyric};
pub use player::{LyricPlayer, PlayerOptions, spawn_player};
pub use settings::Settings;
