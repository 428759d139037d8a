//! Lyric playback scheduler
//!
//! Activates timeline lines in step with a playing media clock:
//! - `state`: the pure line-advance state machine
//! - `timer`: clock/timer collaborators and the hybrid `Deadline`
//! - `driver`: tokio host running a player on its own task
//!
//! ## Architecture
//! ```text
//! play/pause/... --> PlayerCore --[Effect]--> LyricPlayer --> Timer / callbacks
//! Timer fired    --> LyricPlayer::handle_timer --> Deadline --> PlayerCore
//! ```

mod driver;
mod state;
#[cfg(test)]
mod testing;
mod timer;

pub use driver::{
    PlayerCommand, PlayerHandle, PlayerSnapshot, SharedPlayerState, TokioClock, TokioTimer,
    spawn_player,
};
pub use state::{
    Anchor, Effect, LineCursor, PlaybackStatus, PlayerCore, TimerAction, find_current_line,
};
pub use timer::{Clock, Deadline, FRAME_INTERVAL_MS, SystemClock, Timer, TimerHandle};

use crate::parser::{LyricInfo, LyricLine};
use crate::settings::{DEFAULT_OFFSET_MS, PlayerSettings, TIMER_THRESHOLD_MS};

/// Called with the index and line each time a line becomes active
pub type LinePlayCallback = Box<dyn FnMut(usize, &LyricLine) + Send>;
/// Called whenever the timeline is replaced
pub type SetLyricCallback = Box<dyn FnMut(&LyricInfo) + Send>;

/// Player construction options
pub struct PlayerOptions {
    /// Device offset (ms), shifts lyrics earlier when positive
    pub offset: f64,
    pub playback_rate: f64,
    /// Remaining delay below which the timer polls every frame
    pub timer_threshold: f64,
    pub on_line_play: LinePlayCallback,
    pub on_set_lyric: SetLyricCallback,
}

impl std::fmt::Debug for PlayerOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerOptions")
            .field("offset", &self.offset)
            .field("playback_rate", &self.playback_rate)
            .field("timer_threshold", &self.timer_threshold)
            .finish_non_exhaustive()
    }
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            offset: DEFAULT_OFFSET_MS,
            playback_rate: 1.0,
            timer_threshold: TIMER_THRESHOLD_MS,
            on_line_play: Box::new(|_, _| {}),
            on_set_lyric: Box::new(|_| {}),
        }
    }
}

impl From<&PlayerSettings> for PlayerOptions {
    fn from(settings: &PlayerSettings) -> Self {
        Self {
            offset: settings.offset_ms,
            playback_rate: settings.playback_rate,
            timer_threshold: settings.timer_threshold_ms,
            ..Default::default()
        }
    }
}

impl PlayerOptions {
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_playback_rate(mut self, rate: f64) -> Self {
        self.playback_rate = rate;
        self
    }

    pub fn with_on_line_play(mut self, f: impl FnMut(usize, &LyricLine) + Send + 'static) -> Self {
        self.on_line_play = Box::new(f);
        self
    }

    pub fn with_on_set_lyric(mut self, f: impl FnMut(&LyricInfo) + Send + 'static) -> Self {
        self.on_set_lyric = Box::new(f);
        self
    }
}

fn is_valid_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

/// Lyric player driven by an injected clock and timer
///
/// The host must pass every fired timer handle to `handle_timer`.
pub struct LyricPlayer<C: Clock, T: Timer> {
    clock: C,
    timer: T,
    deadline: Deadline<TimerAction>,
    core: PlayerCore,
    lyric_info: LyricInfo,
    on_line_play: LinePlayCallback,
    on_set_lyric: SetLyricCallback,
}

impl<C: Clock, T: Timer> std::fmt::Debug for LyricPlayer<C, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LyricPlayer")
            .field("core", &self.core)
            .field("lines", &self.lyric_info.lines.len())
            .finish_non_exhaustive()
    }
}

impl<C: Clock, T: Timer> LyricPlayer<C, T> {
    /// Create a player holding the empty timeline
    pub fn new(clock: C, timer: T, options: PlayerOptions) -> Self {
        let playback_rate = if is_valid_rate(options.playback_rate) {
            options.playback_rate
        } else {
            tracing::warn!(
                "Invalid playback rate {}, falling back to 1.0",
                options.playback_rate
            );
            1.0
        };
        let mut player = Self {
            clock,
            timer,
            deadline: Deadline::new(options.timer_threshold),
            core: PlayerCore::new(options.offset, playback_rate),
            lyric_info: LyricInfo::default(),
            on_line_play: options.on_line_play,
            on_set_lyric: options.on_set_lyric,
        };
        (player.on_set_lyric)(&player.lyric_info);
        player
    }

    // ============ Playback Control ============

    /// Start playing from media position `media_time` (ms)
    pub fn play(&mut self, media_time: f64) {
        let now = self.clock.now();
        let effects = self.core.play(&self.lyric_info, media_time, now);
        self.apply(effects);
    }

    pub fn pause(&mut self) {
        let now = self.clock.now();
        let effects = self.core.pause(&self.lyric_info, now);
        self.apply(effects);
    }

    /// Change the playback rate; non-positive rates are rejected
    pub fn update_playback_rate(&mut self, rate: f64) {
        if !is_valid_rate(rate) {
            tracing::warn!("Ignoring invalid playback rate {}", rate);
            return;
        }
        let now = self.clock.now();
        let effects = self.core.set_playback_rate(&self.lyric_info, rate, now);
        self.apply(effects);
    }

    /// Change the device offset, effective on the next `play`
    pub fn update_offset(&mut self, offset: f64) {
        self.core.set_offset(offset);
    }

    /// Replace the timeline, pausing first if playing
    pub fn update_lyric(&mut self, info: LyricInfo) {
        if self.core.is_playing() {
            self.pause();
        }
        tracing::debug!("Lyric updated: {} lines", info.lines.len());
        self.lyric_info = info;
        self.core.reset_for(&self.lyric_info);
        (self.on_set_lyric)(&self.lyric_info);
    }

    /// Deliver a fired timer
    pub fn handle_timer(&mut self, handle: TimerHandle) {
        let now = self.clock.now();
        if let Some(action) = self.deadline.fire(&mut self.timer, handle, now) {
            tracing::trace!("Timer {:?} due at {}ms", action, now);
            let effects = self.core.on_timer(&self.lyric_info, action, now);
            self.apply(effects);
        }
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::LinePlay(index) => {
                    if let Some(line) = self.lyric_info.lines.get(index) {
                        (self.on_line_play)(index, line);
                    }
                }
                Effect::Arm { action, delay_ms } => {
                    let now = self.clock.now();
                    self.deadline.start(&mut self.timer, now, delay_ms, action);
                }
                Effect::Cancel => self.deadline.clear(&mut self.timer),
            }
        }
    }

    // ============ State Queries ============

    pub fn status(&self) -> PlaybackStatus {
        self.core.status()
    }

    pub fn is_playing(&self) -> bool {
        self.core.is_playing()
    }

    pub fn anchor(&self) -> Anchor {
        self.core.anchor()
    }

    pub fn line_info(&self) -> LineCursor {
        self.core.line_info()
    }

    pub fn lyric_info(&self) -> &LyricInfo {
        &self.lyric_info
    }

    /// Lyric time now, offsets included
    pub fn current_time(&self) -> f64 {
        self.core.current_time(self.clock.now())
    }

    pub fn offset(&self) -> f64 {
        self.core.offset()
    }

    pub fn playback_rate(&self) -> f64 {
        self.core.playback_rate()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::testing::{ManualClock, ManualTimer, manual_pair};
    use super::*;
    use crate::parser::{LyricTracks, parse_lyric};

    type TestPlayer = LyricPlayer<ManualClock, ManualTimer>;

    struct Harness {
        player: TestPlayer,
        clock: ManualClock,
        timer: ManualTimer,
        played: Arc<Mutex<Vec<usize>>>,
        set_count: Arc<Mutex<usize>>,
    }

    impl Harness {
        fn new(offset: f64) -> Self {
            let (clock, timer) = manual_pair();
            let played = Arc::new(Mutex::new(Vec::new()));
            let set_count = Arc::new(Mutex::new(0));
            let options = {
                let played = played.clone();
                let set_count = set_count.clone();
                PlayerOptions::default()
                    .with_offset(offset)
                    .with_on_line_play(move |index, _| played.lock().push(index))
                    .with_on_set_lyric(move |_| *set_count.lock() += 1)
            };
            let player = LyricPlayer::new(clock.clone(), timer.clone(), options);
            Self {
                player,
                clock,
                timer,
                played,
                set_count,
            }
        }

        /// Deliver every timer due up to `target`, then move the clock there
        fn run_until(&mut self, target: f64) {
            while let Some((handle, due)) = self.timer.peek_next() {
                if due > target {
                    break;
                }
                self.timer.pop_next();
                self.clock.set(due.max(self.clock.now()));
                self.player.handle_timer(handle);
            }
            self.clock.set(target);
        }

        fn played(&self) -> Vec<usize> {
            self.played.lock().clone()
        }
    }

    fn timeline() -> LyricInfo {
        parse_lyric(&LyricTracks::original(
            "[00:01.00]one\n[00:02.00]two\n[00:03.00]three",
        ))
    }

    #[test]
    fn test_constructor_announces_empty_lyric() {
        let harness = Harness::new(0.0);
        assert_eq!(*harness.set_count.lock(), 1);
        assert!(harness.player.lyric_info().is_empty());
        assert_eq!(harness.player.status(), PlaybackStatus::Stopped);
    }

    #[test]
    fn test_play_empty_does_nothing() {
        let mut harness = Harness::new(0.0);
        harness.player.play(0.0);
        assert_eq!(harness.player.status(), PlaybackStatus::Stopped);
        assert_eq!(harness.timer.pending_count(), 0);
    }

    #[test]
    fn test_plays_through_timeline() {
        let mut harness = Harness::new(0.0);
        harness.player.update_lyric(timeline());
        assert_eq!(*harness.set_count.lock(), 2);

        harness.player.play(0.0);
        assert_eq!(harness.played(), vec![0]);

        harness.run_until(1999.0);
        assert_eq!(harness.played(), vec![0]);
        harness.run_until(2100.0);
        assert_eq!(harness.played(), vec![0, 1]);
        harness.run_until(5000.0);
        assert_eq!(harness.played(), vec![0, 1, 2]);
        // The last plain line has no duration
        assert_eq!(harness.player.status(), PlaybackStatus::Paused);
        assert_eq!(harness.timer.pending_count(), 0);
    }

    #[test]
    fn test_line_fires_on_first_frame_after_start() {
        let mut harness = Harness::new(0.0);
        harness.player.update_lyric(timeline());
        harness.player.play(1500.0);
        harness.run_until(499.0);
        assert_eq!(harness.played(), vec![0]);
        harness.run_until(500.0 + 2.0 * FRAME_INTERVAL_MS);
        assert_eq!(harness.played(), vec![0, 1]);
    }

    #[test]
    fn test_cursor_tracks_clock() {
        let mut harness = Harness::new(0.0);
        harness.player.update_lyric(timeline());
        harness.player.play(0.0);
        for target in [500.0, 1200.0, 2300.0, 2900.0] {
            harness.run_until(target);
            let time = harness.player.current_time();
            let expected = find_current_line(&harness.player.lyric_info().lines, time, 0);
            assert_eq!(harness.player.line_info().now, expected as i64);
        }
    }

    #[test]
    fn test_pause_twice_equals_once() {
        let mut harness = Harness::new(0.0);
        harness.player.update_lyric(timeline());
        harness.player.play(0.0);
        harness.run_until(1500.0);
        harness.player.pause();
        let after_first = (harness.played(), harness.player.line_info());
        harness.player.pause();
        assert_eq!((harness.played(), harness.player.line_info()), after_first);
        assert_eq!(harness.timer.pending_count(), 0);
    }

    #[test]
    fn test_offset_applies_on_next_play() {
        let mut harness = Harness::new(0.0);
        harness.player.update_lyric(timeline());
        harness.player.update_offset(600.0);
        assert_eq!(harness.player.offset(), 600.0);
        harness.player.play(1500.0);
        // 1500 + 600 is already past the second line
        assert_eq!(harness.played(), vec![1]);
    }

    #[test]
    fn test_rate_change_while_playing() {
        let mut harness = Harness::new(0.0);
        harness.player.update_lyric(timeline());
        harness.player.play(1000.0);
        harness.run_until(500.0);
        harness.player.update_playback_rate(2.0);
        assert_eq!(harness.player.playback_rate(), 2.0);
        // Media at 1500, so the next line is 250ms of clock time away
        harness.run_until(700.0);
        assert_eq!(harness.played(), vec![0, 0]);
        harness.run_until(800.0);
        assert_eq!(harness.played(), vec![0, 0, 1]);
    }

    #[test]
    fn test_invalid_rate_ignored() {
        let mut harness = Harness::new(0.0);
        harness.player.update_playback_rate(0.0);
        harness.player.update_playback_rate(f64::NAN);
        assert_eq!(harness.player.playback_rate(), 1.0);
    }

    #[test]
    fn test_invalid_initial_rate_falls_back() {
        for rate in [0.0, -2.0, f64::NAN, f64::INFINITY] {
            let (clock, timer) = manual_pair();
            let options = PlayerOptions::default()
                .with_offset(0.0)
                .with_playback_rate(rate);
            let mut player = LyricPlayer::new(clock.clone(), timer.clone(), options);
            assert_eq!(player.playback_rate(), 1.0);

            player.update_lyric(timeline());
            player.play(1000.0);
            // First frame, then a finite coarse wait for the second line
            let (handle, due) = timer.pop_next().unwrap();
            clock.set(due);
            player.handle_timer(handle);
            let (_, coarse_due) = timer.peek_next().unwrap();
            assert!(coarse_due.is_finite());
            assert!((coarse_due - 800.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_settings_rate_is_validated() {
        let settings = PlayerSettings {
            playback_rate: 0.0,
            ..Default::default()
        };
        let (clock, timer) = manual_pair();
        let player = LyricPlayer::new(clock, timer, PlayerOptions::from(&settings));
        assert_eq!(player.playback_rate(), 1.0);
    }

    #[test]
    fn test_update_lyric_pauses_and_resets() {
        let mut harness = Harness::new(0.0);
        harness.player.update_lyric(timeline());
        harness.player.play(0.0);
        harness.player.update_lyric(timeline());
        assert_eq!(harness.player.status(), PlaybackStatus::Stopped);
        assert_eq!(harness.player.line_info(), LineCursor { now: 0, max: 2 });
        assert_eq!(harness.timer.pending_count(), 0);
        assert_eq!(*harness.set_count.lock(), 3);
    }
}
