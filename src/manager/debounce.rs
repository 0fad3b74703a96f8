//! Single-slot debounce timer

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Quiet period before a debounced content update is laid out
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(150);

/// Monotonic time source, measured from an arbitrary origin
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Wall-clock time since construction
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock advanced by hand; clones share the same time
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

#[derive(Debug)]
struct Pending<T> {
    deadline: Duration,
    value: T,
}

/// Holds at most one pending value and the time it becomes due.
///
/// Scheduling again replaces both, so a burst of updates collapses into the
/// last one.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<Pending<T>>,
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(DEBOUNCE_DELAY)
    }
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Restart the timer with a new value. Returns true if a value was replaced.
    pub fn schedule(&mut self, value: T, now: Duration) -> bool {
        self.pending
            .replace(Pending {
                deadline: now + self.delay,
                value,
            })
            .is_some()
    }

    /// Take the value if its deadline has passed
    pub fn take_due(&mut self, now: Duration) -> Option<T> {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.deadline <= now);
        if due {
            self.take()
        } else {
            None
        }
    }

    /// Take the value regardless of its deadline
    pub fn take(&mut self) -> Option<T> {
        self.pending.take().map(|pending| pending.value)
    }

    /// Drop the pending value. Returns true if there was one.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.pending.as_ref().map(|pending| pending.deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
