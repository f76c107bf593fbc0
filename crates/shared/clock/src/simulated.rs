use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tempo_core::{Duration, Timestamp, TimerId};
use tempo_ports::{Clock, Timer, TimerReceiver};

use crate::registry::TimerRegistry;

/// Manually advanced clock for deterministic tests
///
/// Time only moves when [`SimulatedClock::advance`] is called. Every timer
/// created by this clock fires synchronously inside the `advance` (or
/// `reset`) call that makes it due, and reports its scheduled deadline
/// rather than the time it was observed at.
///
/// Clones are handles to the same clock. One read-write lock guards the
/// current time and the state of every timer of the clock, so operations on
/// one clock never interleave.
///
/// ```ignore
/// use tempo_clock::{Clock, SimulatedClock, Timer};
/// use chrono::Duration;
///
/// let clock = SimulatedClock::new(start);
/// let timer = clock.new_timer(Duration::seconds(5));
///
/// clock.advance(Duration::seconds(5));
/// assert_eq!(timer.receiver().try_recv()?, start + Duration::seconds(5));
/// ```
#[derive(Clone)]
pub struct SimulatedClock {
    registry: Arc<RwLock<TimerRegistry>>,
}

impl SimulatedClock {
    /// Create a simulated clock frozen at `start`
    pub fn new(start: Timestamp) -> Self {
        Self {
            registry: Arc::new(RwLock::new(TimerRegistry::new(start))),
        }
    }

    /// Move simulated time forward, firing every timer that becomes due
    ///
    /// # Panics
    /// If `step` is negative. Simulated time never goes backwards, and a
    /// negative step is a bug in the test driving the clock; the clock is
    /// left untouched.
    pub fn advance(&self, step: Duration) {
        assert!(
            step >= Duration::zero(),
            "Time can only advance in the positive direction (got {})",
            step
        );
        self.registry.write().advance(step);
    }

    /// Advance exactly to the earliest armed deadline
    ///
    /// Returns that deadline, or `None` (leaving time untouched) when no
    /// timer is armed.
    pub fn advance_to_next(&self) -> Option<Timestamp> {
        self.registry.write().advance_to_next()
    }

    /// Number of armed timers
    pub fn pending_timers(&self) -> usize {
        self.registry.read().pending()
    }

    /// Earliest deadline among armed timers
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.registry.read().next_deadline()
    }

    /// Like [`Clock::new_timer`], but returns the concrete timer type
    pub fn timer(&self, duration: Duration) -> SimulatedTimer {
        let (id, receiver) = self.registry.write().register();
        let timer = SimulatedTimer {
            id,
            registry: Arc::clone(&self.registry),
            receiver,
        };
        timer.reset(duration);
        timer
    }
}

impl Default for SimulatedClock {
    /// Starts at the Unix epoch
    fn default() -> Self {
        Self::new(Timestamp::default())
    }
}

impl Clock for SimulatedClock {
    fn now(&self) -> Timestamp {
        self.registry.read().now()
    }

    fn new_timer(&self, duration: Duration) -> Box<dyn Timer> {
        Box::new(self.timer(duration))
    }

    fn name(&self) -> &str {
        "SimulatedClock"
    }
}

impl fmt::Debug for SimulatedClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.read();
        f.debug_struct("SimulatedClock")
            .field("now", &registry.now())
            .field("pending_timers", &registry.pending())
            .finish()
    }
}

/// Timer driven by a [`SimulatedClock`]
///
/// Holds only its id and a handle to the clock's shared registry; the
/// deadline and armed flag live in the registry under the clock's lock.
/// Dropping an armed timer leaves it scheduled: it still fires into its
/// receiver, which callers may have cloned, and is forgotten after that.
pub struct SimulatedTimer {
    id: TimerId,
    registry: Arc<RwLock<TimerRegistry>>,
    receiver: TimerReceiver,
}

impl SimulatedTimer {
    /// Whether the timer is armed (will fire on a future advance)
    pub fn is_armed(&self) -> bool {
        self.registry.read().is_armed(self.id)
    }
}

impl Timer for SimulatedTimer {
    fn reset(&self, duration: Duration) -> bool {
        self.registry.write().arm(self.id, duration)
    }

    fn stop(&self) -> bool {
        self.registry.write().disarm(self.id)
    }

    fn receiver(&self) -> &TimerReceiver {
        &self.receiver
    }
}

impl Drop for SimulatedTimer {
    fn drop(&mut self) {
        self.registry.write().release(self.id);
    }
}

impl fmt::Debug for SimulatedTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatedTimer")
            .field("id", &self.id)
            .field("armed", &self.is_armed())
            .finish()
    }
}
