use std::sync::Arc;

use tempo_core::{Duration, Timestamp};

use crate::Timer;

/// Port for time abstraction
///
/// This allows the system to use different time sources:
/// - Real system time for production
/// - Manually advanced simulated time for deterministic tests
///
/// Implementations must be safe to share across threads, so a clock can be
/// handed to background workers.
pub trait Clock: Send + Sync {
    /// Get the current time according to this clock
    fn now(&self) -> Timestamp;

    /// Create a timer that fires `duration` after `now()`
    ///
    /// A zero or negative duration means the timer is due immediately.
    fn new_timer(&self, duration: Duration) -> Box<dyn Timer>;

    /// Get the clock's name/identifier for debugging
    fn name(&self) -> &str {
        "Clock"
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }

    fn new_timer(&self, duration: Duration) -> Box<dyn Timer> {
        (**self).new_timer(duration)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
