//! Clock and timer collaborators
//!
//! The scheduler never reads the time or sleeps on its own. A host provides a
//! monotonic `Clock` and a `Timer` that reports fired handles back through
//! `LyricPlayer::handle_timer`.

use std::time::Instant;

/// Delay of one animation frame at 60 Hz
pub const FRAME_INTERVAL_MS: f64 = 1000.0 / 60.0;

/// Monotonic millisecond clock
pub trait Clock {
    fn now(&self) -> f64;
}

/// Identifies one scheduled timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// One-shot timeout primitive
pub trait Timer {
    /// Fire once after `delay_ms`
    fn schedule(&mut self, delay_ms: f64) -> TimerHandle;

    /// Fire on the next animation frame
    fn schedule_frame(&mut self) -> TimerHandle {
        self.schedule(FRAME_INTERVAL_MS)
    }

    /// Cancel a pending timeout; unknown handles are ignored
    fn cancel(&mut self, handle: TimerHandle);
}

/// Wall clock backed by `Instant`
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// Waiting for a frame tick
    Frame,
    /// Waiting out the bulk of the delay
    Coarse,
}

/// Hybrid timeout
///
/// Long delays sleep through a coarse timeout until `threshold` before the
/// deadline, then poll every frame so the action fires on the first frame at
/// or after it.
#[derive(Debug)]
pub struct Deadline<A> {
    threshold: f64,
    invoke_time: f64,
    action: Option<A>,
    pending: Option<(TimerHandle, Stage)>,
}

impl<A> Deadline<A> {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            invoke_time: 0.0,
            action: None,
            pending: None,
        }
    }

    /// Whether an action is waiting
    pub fn is_armed(&self) -> bool {
        self.action.is_some()
    }

    /// Replace any pending action with `action` due `delay_ms` after `now`
    pub fn start(&mut self, timer: &mut impl Timer, now: f64, delay_ms: f64, action: A) {
        self.clear(timer);
        self.invoke_time = now + delay_ms;
        self.action = Some(action);
        self.pending = Some((timer.schedule_frame(), Stage::Frame));
    }

    /// Drop the pending action; safe to call repeatedly
    pub fn clear(&mut self, timer: &mut impl Timer) {
        if let Some((handle, _)) = self.pending.take() {
            timer.cancel(handle);
        }
        self.action = None;
    }

    /// Handle a fired timer, returning the action once it is due
    ///
    /// Handles other than the pending one are stale and ignored.
    pub fn fire(&mut self, timer: &mut impl Timer, handle: TimerHandle, now: f64) -> Option<A> {
        let stage = match self.pending {
            Some((pending, stage)) if pending == handle => stage,
            _ => return None,
        };
        self.pending = None;

        match stage {
            Stage::Coarse => {
                self.pending = Some((timer.schedule_frame(), Stage::Frame));
                None
            }
            Stage::Frame => {
                let diff = self.invoke_time - now;
                if diff <= 0.0 {
                    return self.action.take();
                }
                self.pending = if diff < self.threshold {
                    Some((timer.schedule_frame(), Stage::Frame))
                } else {
                    Some((timer.schedule(diff - self.threshold), Stage::Coarse))
                };
                None
            }
        }
    }
}
