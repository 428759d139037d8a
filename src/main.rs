//! lyric-timeline - print a parsed lyric timeline, optionally playing it

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use lyric_timeline::parser::{LyricParser, LyricTracks};
use lyric_timeline::player::{PlaybackStatus, PlayerOptions, spawn_player};
use lyric_timeline::settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "lyric-timeline", version, about = "Parse timestamped lyrics into a timeline")]
struct Cli {
    /// Line-synced original lyric file
    original: Option<PathBuf>,

    /// Line-synced translation file
    #[arg(long)]
    translated: Option<PathBuf>,

    /// Line-synced romanization file
    #[arg(long)]
    roman: Option<PathBuf>,

    /// Word-synced lyric file
    #[arg(long)]
    dynamic: Option<PathBuf>,

    /// Settings file (JSON); defaults to the user config directory
    #[arg(long)]
    config: Option<PathBuf>,

    /// Play the timeline from this media position (ms), printing each line
    #[arg(long, value_name = "MS")]
    play: Option<f64>,

    /// Print compact JSON
    #[arg(long)]
    compact: bool,
}

fn read_track(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read lyric file {:?}", path)),
        None => Ok(String::new()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from_file(path)
            .with_context(|| format!("Failed to load settings from {:?}", path))?,
        None => Settings::load(),
    };

    let tracks = LyricTracks {
        original: read_track(cli.original.as_deref())?,
        translated: read_track(cli.translated.as_deref())?,
        roman: read_track(cli.roman.as_deref())?,
        dynamic: read_track(cli.dynamic.as_deref())?,
    };
    let info = LyricParser::new(settings.parser.clone()).parse(&tracks);

    let json = if cli.compact {
        serde_json::to_string(&info)?
    } else {
        serde_json::to_string_pretty(&info)?
    };
    println!("{}", json);

    let Some(start) = cli.play else {
        return Ok(());
    };
    if info.is_empty() || !info.config.can_auto_scroll {
        tracing::warn!("Timeline cannot be played: no timed lines");
        return Ok(());
    }

    let options = PlayerOptions::from(&settings.player).with_on_line_play(|index, line| {
        println!("[{:>8.0}] #{} {}", line.time, index, line.content.original);
    });
    let handle = spawn_player(options);
    handle.set_lyric(info);
    handle.play(start);

    loop {
        tokio::time::sleep(Duration::from_millis(50)).await;
        if handle.snapshot().status == PlaybackStatus::Paused {
            break;
        }
    }
    handle.shutdown().await;
    Ok(())
}
