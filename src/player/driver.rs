//! Tokio host for the lyric player
//!
//! `spawn_player` runs a `LyricPlayer` on its own task. Commands arrive over an
//! unbounded channel and fired timers over another; a shared snapshot lets any
//! task read status and cursor without blocking.
//!
//! ## Architecture
//! ```text
//! Caller (PlayerHandle) --[PlayerCommand]--> Player task (LyricPlayer)
//! TokioTimer sleeps     --[TimerHandle]----> Player task
//! Caller                <--[SharedState]---- Player task (non-blocking reads)
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::state::{LineCursor, PlaybackStatus};
use super::timer::{Clock, Timer, TimerHandle};
use super::{LyricPlayer, PlayerOptions};
use crate::parser::LyricInfo;

// ============ Collaborators ============

/// Clock on the tokio time source, so paused test time applies
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Timer spawning one sleep task per timeout
///
/// Fired handles are sent back over `fire_tx`.
#[derive(Debug)]
pub struct TokioTimer {
    fire_tx: mpsc::UnboundedSender<TimerHandle>,
    next_id: u64,
    tasks: HashMap<TimerHandle, JoinHandle<()>>,
}

impl TokioTimer {
    pub fn new(fire_tx: mpsc::UnboundedSender<TimerHandle>) -> Self {
        Self {
            fire_tx,
            next_id: 0,
            tasks: HashMap::new(),
        }
    }
}

impl Timer for TokioTimer {
    fn schedule(&mut self, delay_ms: f64) -> TimerHandle {
        self.tasks.retain(|_, task| !task.is_finished());

        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        let delay = Duration::try_from_secs_f64(delay_ms.max(0.0) / 1000.0).unwrap_or_else(|e| {
            tracing::warn!("Timeout of {} ms out of range ({}), sleeping indefinitely", delay_ms, e);
            Duration::MAX
        });
        let fire_tx = self.fire_tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = fire_tx.send(handle);
        });
        self.tasks.insert(handle, task);
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(task) = self.tasks.remove(&handle) {
            task.abort();
        }
    }
}

impl Drop for TokioTimer {
    fn drop(&mut self) {
        for task in self.tasks.values() {
            task.abort();
        }
    }
}

// ============ Commands ============

/// Commands sent to the player task
#[derive(Debug)]
pub enum PlayerCommand {
    /// Start from a media position (ms)
    Play { media_time: f64 },
    Pause,
    SetPlaybackRate { rate: f64 },
    SetOffset { offset: f64 },
    /// Replace the timeline
    SetLyric { info: LyricInfo },
    Shutdown,
}

pub type PlayerCommandSender = mpsc::UnboundedSender<PlayerCommand>;
pub type PlayerCommandReceiver = mpsc::UnboundedReceiver<PlayerCommand>;

// ============ Shared State ============

/// Player state as last published by the player task
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayerSnapshot {
    pub status: PlaybackStatus,
    pub line: LineCursor,
    /// Lyric time when published
    pub current_time: f64,
    pub line_count: usize,
}

/// Thread-safe shared player state
#[derive(Debug, Clone, Default)]
pub struct SharedPlayerState {
    inner: Arc<RwLock<PlayerSnapshot>>,
}

impl SharedPlayerState {
    pub fn get(&self) -> PlayerSnapshot {
        *self.inner.read()
    }

    pub fn is_playing(&self) -> bool {
        self.inner.read().status == PlaybackStatus::Playing
    }

    fn publish<C: Clock, T: Timer>(&self, player: &LyricPlayer<C, T>) {
        *self.inner.write() = PlayerSnapshot {
            status: player.status(),
            line: player.line_info(),
            current_time: player.current_time(),
            line_count: player.lyric_info().lines.len(),
        };
    }
}

// ============ Handle ============

/// Handle for controlling a player task
///
/// All control methods send a command and return immediately.
#[derive(Debug)]
pub struct PlayerHandle {
    command_tx: PlayerCommandSender,
    state: SharedPlayerState,
    task: JoinHandle<()>,
}

impl PlayerHandle {
    pub fn play(&self, media_time: f64) {
        let _ = self.command_tx.send(PlayerCommand::Play { media_time });
    }

    pub fn pause(&self) {
        let _ = self.command_tx.send(PlayerCommand::Pause);
    }

    pub fn set_playback_rate(&self, rate: f64) {
        let _ = self.command_tx.send(PlayerCommand::SetPlaybackRate { rate });
    }

    pub fn set_offset(&self, offset: f64) {
        let _ = self.command_tx.send(PlayerCommand::SetOffset { offset });
    }

    pub fn set_lyric(&self, info: LyricInfo) {
        let _ = self.command_tx.send(PlayerCommand::SetLyric { info });
    }

    /// Last published state
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.state.get()
    }

    pub fn state(&self) -> &SharedPlayerState {
        &self.state
    }

    /// Stop the player task and wait for it to exit
    pub async fn shutdown(self) {
        let _ = self.command_tx.send(PlayerCommand::Shutdown);
        if let Err(e) = self.task.await {
            tracing::error!("Player task failed: {}", e);
        }
    }
}

/// Spawn a player task on the current tokio runtime
pub fn spawn_player(options: PlayerOptions) -> PlayerHandle {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (fire_tx, fire_rx) = mpsc::unbounded_channel();
    let state = SharedPlayerState::default();

    let player = LyricPlayer::new(TokioClock::new(), TokioTimer::new(fire_tx), options);
    let task = tokio::spawn(player_main(player, command_rx, fire_rx, state.clone()));

    PlayerHandle {
        command_tx,
        state,
        task,
    }
}

/// Main loop for the player task
async fn player_main(
    mut player: LyricPlayer<TokioClock, TokioTimer>,
    mut command_rx: PlayerCommandReceiver,
    mut fire_rx: mpsc::UnboundedReceiver<TimerHandle>,
    state: SharedPlayerState,
) {
    tracing::debug!("Player task started");
    state.publish(&player);

    loop {
        tokio::select! {
            command = command_rx.recv() => {
                let Some(command) = command else { break };
                tracing::trace!("Player command: {:?}", command);
                match command {
                    PlayerCommand::Play { media_time } => player.play(media_time),
                    PlayerCommand::Pause => player.pause(),
                    PlayerCommand::SetPlaybackRate { rate } => player.update_playback_rate(rate),
                    PlayerCommand::SetOffset { offset } => player.update_offset(offset),
                    PlayerCommand::SetLyric { info } => player.update_lyric(info),
                    PlayerCommand::Shutdown => break,
                }
            }
            Some(handle) = fire_rx.recv() => player.handle_timer(handle),
        }
        state.publish(&player);
    }

    player.pause();
    tracing::debug!("Player task stopped");
}
