//! Line scheduling state machine
//!
//! `PlayerCore` holds no clock and no timer. Every transition takes the
//! current timeline and a clock sample and returns the effects the caller
//! must perform, in order.

use crate::parser::{LyricInfo, LyricLine};

/// Playback status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Clock reference captured at `play`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Anchor {
    /// Clock time the media position was sampled at, shifted by the offsets
    pub performance_time: f64,
    /// Media position at `play`
    pub start_time: f64,
}

/// Current and last line index
///
/// `now` is -1 before the first line has been activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineCursor {
    pub now: i64,
    pub max: i64,
}

/// What a fired timer means
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Advance to the next line
    Refresh,
    /// The last line finished
    AutoPause,
}

/// Side effect requested by a transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    /// Activate a line
    LinePlay(usize),
    /// Replace the pending timer
    Arm { action: TimerAction, delay_ms: f64 },
    /// Drop the pending timer
    Cancel,
}

/// Index of the line active at `time`, scanning from `start`
///
/// The greatest index whose line starts at or before `time`, never below 0.
pub fn find_current_line(lines: &[LyricLine], time: f64, start: usize) -> usize {
    if time <= 0.0 {
        return 0;
    }
    for (index, line) in lines.iter().enumerate().skip(start) {
        if time < line.time {
            return index.saturating_sub(1);
        }
    }
    lines.len().saturating_sub(1)
}

/// Scheduler state
#[derive(Debug, Clone)]
pub struct PlayerCore {
    status: PlaybackStatus,
    anchor: Anchor,
    cursor: LineCursor,
    playback_rate: f64,
    offset: f64,
    /// Offset folded into the anchor at the last `play`
    applied_offset: f64,
}

impl PlayerCore {
    pub fn new(offset: f64, playback_rate: f64) -> Self {
        Self {
            status: PlaybackStatus::Stopped,
            anchor: Anchor::default(),
            cursor: LineCursor { now: 0, max: -1 },
            playback_rate,
            offset,
            applied_offset: 0.0,
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn line_info(&self) -> LineCursor {
        self.cursor
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn playback_rate(&self) -> f64 {
        self.playback_rate
    }

    /// Lyric time at clock time `now`, offsets included
    pub fn current_time(&self, now: f64) -> f64 {
        (now - self.anchor.performance_time) * self.playback_rate + self.anchor.start_time
    }

    /// Media position at clock time `now`, offsets excluded
    pub fn media_time(&self, now: f64) -> f64 {
        (now - self.anchor.performance_time - self.applied_offset) * self.playback_rate
            + self.anchor.start_time
    }

    /// Start or restart playback at `media_time`
    pub fn play(&mut self, info: &LyricInfo, media_time: f64, now: f64) -> Vec<Effect> {
        if info.is_empty() {
            return Vec::new();
        }

        let mut effects = vec![Effect::Cancel];
        self.status = PlaybackStatus::Playing;
        self.applied_offset = (self.offset + info.config.offset).trunc();
        self.anchor = Anchor {
            performance_time: now - self.applied_offset,
            start_time: media_time,
        };

        let time = self.current_time(now);
        self.cursor = LineCursor {
            now: find_current_line(&info.lines, time, 0) as i64 - 1,
            max: info.lines.len() as i64 - 1,
        };
        tracing::trace!(
            "Play at {}ms (lyric time {}ms, cursor {})",
            media_time,
            time,
            self.cursor.now
        );

        self.refresh(info, now, &mut effects);
        effects
    }

    /// Pause, activating the line under the clock if it moved
    pub fn pause(&mut self, info: &LyricInfo, now: f64) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.pause_into(info, now, &mut effects);
        effects
    }

    fn pause_into(&mut self, info: &LyricInfo, now: f64, effects: &mut Vec<Effect>) {
        if self.status != PlaybackStatus::Playing {
            return;
        }
        self.status = PlaybackStatus::Paused;
        effects.push(Effect::Cancel);

        if self.cursor.now >= self.cursor.max || !info.config.can_auto_scroll {
            return;
        }
        let found = find_current_line(&info.lines, self.current_time(now), 0);
        if found as i64 != self.cursor.now {
            self.cursor.now = found as i64;
            effects.push(Effect::LinePlay(found));
        }
        tracing::trace!("Paused at line {}", self.cursor.now);
    }

    /// Handle a fired timer
    pub fn on_timer(&mut self, info: &LyricInfo, action: TimerAction, now: f64) -> Vec<Effect> {
        let mut effects = Vec::new();
        match action {
            TimerAction::Refresh => {
                if self.is_playing() {
                    self.refresh(info, now, &mut effects);
                }
            }
            TimerAction::AutoPause => self.pause_into(info, now, &mut effects),
        }
        effects
    }

    /// Change the playback rate, re-anchoring if playing
    pub fn set_playback_rate(&mut self, info: &LyricInfo, rate: f64, now: f64) -> Vec<Effect> {
        if !self.is_playing() {
            self.playback_rate = rate;
            return Vec::new();
        }
        let position = self.media_time(now);
        self.playback_rate = rate;
        self.play(info, position, now)
    }

    /// Takes effect on the next `play`
    pub fn set_offset(&mut self, offset: f64) {
        self.offset = offset;
    }

    /// Reset the cursor for a new timeline
    pub fn reset_for(&mut self, info: &LyricInfo) {
        self.status = PlaybackStatus::Stopped;
        self.cursor = LineCursor {
            now: 0,
            max: info.lines.len() as i64 - 1,
        };
    }

    /// Advance the cursor until a line is activated or the timeline ends
    fn refresh(&mut self, info: &LyricInfo, now: f64, effects: &mut Vec<Effect>) {
        if !info.config.can_auto_scroll || info.is_empty() {
            return;
        }
        let lines = &info.lines;
        let max = lines.len() as i64 - 1;

        loop {
            self.cursor.now += 1;

            if self.cursor.now >= max {
                self.cursor.now = max;
                let index = max as usize;
                effects.push(Effect::LinePlay(index));
                let duration = lines[index].duration;
                if duration > 0.0 {
                    effects.push(Effect::Arm {
                        action: TimerAction::AutoPause,
                        delay_ms: duration / self.playback_rate,
                    });
                } else {
                    self.pause_into(info, now, effects);
                }
                return;
            }

            let index = self.cursor.now as usize;
            let line = &lines[index];
            let time = self.current_time(now);
            let drift = time - line.time;

            if drift >= 0.0 || index == 0 {
                let next = &lines[index + 1];
                let delay = (next.time - line.time - drift) / self.playback_rate;
                if delay > 0.0 {
                    tracing::trace!("Line {} active, next in {}ms", index, delay);
                    effects.push(Effect::Arm {
                        action: TimerAction::Refresh,
                        delay_ms: delay,
                    });
                    effects.push(Effect::LinePlay(index));
                    return;
                }
                // Already past the next line
                let found = find_current_line(lines, time, index + 1) as i64;
                if found > self.cursor.now {
                    self.cursor.now = found - 1;
                }
            } else {
                self.cursor.now = find_current_line(lines, time, index) as i64 - 1;
            }
        }
    }
}
