//! Virtual clock and timer for deterministic scheduler tests

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::timer::{Clock, Timer, TimerHandle};

#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn set(&self, now: f64) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}

#[derive(Debug, Default)]
struct Queue {
    next_id: u64,
    pending: Vec<(TimerHandle, f64)>,
}

/// Records scheduled timeouts; tests pop and deliver them by hand
#[derive(Debug, Clone)]
pub struct ManualTimer {
    clock: ManualClock,
    queue: Rc<RefCell<Queue>>,
}

impl ManualTimer {
    /// Earliest pending timeout, first scheduled wins ties
    pub fn peek_next(&self) -> Option<(TimerHandle, f64)> {
        let queue = self.queue.borrow();
        let mut next: Option<(TimerHandle, f64)> = None;
        for &(handle, due) in &queue.pending {
            if next.is_none_or(|(_, best)| due < best) {
                next = Some((handle, due));
            }
        }
        next
    }

    pub fn pop_next(&self) -> Option<(TimerHandle, f64)> {
        let next = self.peek_next()?;
        self.queue.borrow_mut().pending.retain(|(h, _)| *h != next.0);
        Some(next)
    }

    pub fn pending_count(&self) -> usize {
        self.queue.borrow().pending.len()
    }
}

impl Timer for ManualTimer {
    fn schedule(&mut self, delay_ms: f64) -> TimerHandle {
        let mut queue = self.queue.borrow_mut();
        queue.next_id += 1;
        let handle = TimerHandle(queue.next_id);
        let due = self.clock.now() + delay_ms.max(0.0);
        queue.pending.push((handle, due));
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.queue.borrow_mut().pending.retain(|(h, _)| *h != handle);
    }
}

/// A clock and a timer sharing the same virtual time
pub fn manual_pair() -> (ManualClock, ManualTimer) {
    let clock = ManualClock::default();
    let timer = ManualTimer {
        clock: clock.clone(),
        queue: Rc::default(),
    };
    (clock, timer)
}
