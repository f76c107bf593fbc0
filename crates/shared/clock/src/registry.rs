use crossbeam_channel::{Sender, TrySendError, bounded};
use log::{debug, trace, warn};
use priority_queue::PriorityQueue;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use tempo_core::{Duration, Timestamp, TimerId};
use tempo_ports::TimerReceiver;

/// Shared state of one simulated clock
///
/// Holds the current simulated time together with every timer's mutable
/// state, so a single lock around the registry makes firing indivisible
/// from `reset`/`stop` on the same timer.
///
/// A timer is armed iff it is queued in `armed`. Every queued deadline is
/// strictly after `now`: anything at or before `now` has already fired.
pub(crate) struct TimerRegistry {
    now: Timestamp,
    next_id: u64,
    /// Armed timers keyed by id, earliest deadline first
    armed: PriorityQueue<TimerId, Reverse<Timestamp>>,
    /// Notification slot of every live timer, armed or not
    slots: HashMap<TimerId, Sender<Timestamp>>,
    /// Armed timers whose handle was dropped; their slot goes at their fire
    orphaned: HashSet<TimerId>,
}

impl TimerRegistry {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now,
            next_id: 0,
            armed: PriorityQueue::new(),
            slots: HashMap::new(),
            orphaned: HashSet::new(),
        }
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// Allocate a new, unarmed timer and return its id and receiver
    pub fn register(&mut self) -> (TimerId, TimerReceiver) {
        let id = TimerId::new(self.next_id);
        self.next_id += 1;

        let (tx, rx) = bounded(1);
        self.slots.insert(id, tx);
        trace!("Registered {}", id);
        (id, rx)
    }

    /// Give up the handle of a timer
    ///
    /// An armed timer stays queued and still fires into its slot, so a
    /// receiver cloned from the handle gets the notification; its slot is
    /// removed by that fire. An unarmed timer is forgotten at once.
    pub fn release(&mut self, id: TimerId) {
        if self.is_armed(id) {
            trace!("Released {} while armed, keeping it until it fires", id);
            self.orphaned.insert(id);
        } else {
            self.slots.remove(&id);
            trace!("Unregistered {}", id);
        }
    }

    pub fn is_armed(&self, id: TimerId) -> bool {
        self.armed.get(&id).is_some()
    }

    pub fn pending(&self) -> usize {
        self.armed.len()
    }

    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.armed.peek().map(|(_, Reverse(deadline))| *deadline)
    }

    /// Arm (or re-arm) a timer to fire `duration` after the current time
    ///
    /// Fires synchronously when the deadline is not in the future.
    /// Returns whether the timer was armed before the call.
    pub fn arm(&mut self, id: TimerId, duration: Duration) -> bool {
        let was_armed = self.is_armed(id);
        let deadline = deadline_after(self.now, duration);
        debug!("Resetting {} to deadline {}", id, deadline);

        if deadline <= self.now {
            self.armed.remove(&id);
            self.fire(id, deadline);
            return was_armed;
        }

        self.armed.push(id, Reverse(deadline));
        if !was_armed {
            debug!("{} became active", id);
        }
        was_armed
    }

    /// Disarm a timer. Returns whether it was armed.
    pub fn disarm(&mut self, id: TimerId) -> bool {
        let was_armed = self.armed.remove(&id).is_some();
        if was_armed {
            debug!("Stopped {}", id);
        }
        was_armed
    }

    /// Move time forward by `step` and fire every timer that became due
    ///
    /// Returns the number of timers fired. `step` must be non-negative.
    pub fn advance(&mut self, step: Duration) -> usize {
        let new_now = self.now.checked_add_signed(step).unwrap_or_else(|| {
            panic!("Simulated time overflowed advancing {} past {}", step, self.now)
        });
        debug!("Advancing the time {} from {} to {}", step, self.now, new_now);
        self.now = new_now;

        let mut fired = 0;
        loop {
            let due = matches!(
                self.armed.peek(),
                Some((_, Reverse(deadline))) if *deadline <= self.now
            );
            if !due {
                break;
            }
            let Some((id, Reverse(deadline))) = self.armed.pop() else {
                break;
            };
            trace!("{} is due ({} <= {})", id, deadline, self.now);
            self.fire(id, deadline);
            fired += 1;
        }
        fired
    }

    /// Jump straight to the earliest armed deadline, firing what is due there
    pub fn advance_to_next(&mut self) -> Option<Timestamp> {
        let deadline = self.next_deadline()?;
        self.advance(deadline - self.now);
        Some(deadline)
    }

    // LOCK_REQUIRED: caller holds the registry write lock and has already
    // removed `id` from `armed`.
    fn fire(&mut self, id: TimerId, deadline: Timestamp) {
        debug!("{} fired at {}", id, deadline);
        let Some(slot) = self.slots.get(&id) else {
            trace!("{} has no notification slot", id);
            return;
        };
        match slot.try_send(deadline) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(
                    "{} fired at {} but its previous notification was never read; dropping the new one",
                    id, deadline
                );
            }
            Err(TrySendError::Disconnected(_)) => {
                trace!("{} receiver is gone", id);
            }
        }

        // A sent value stays readable after its sender is dropped
        if self.orphaned.remove(&id) {
            self.slots.remove(&id);
            trace!("Unregistered {}", id);
        }
    }
}

/// `now + duration`, saturating at the representable range
fn deadline_after(now: Timestamp, duration: Duration) -> Timestamp {
    match now.checked_add_signed(duration) {
        Some(deadline) => deadline,
        None if duration > Duration::zero() => Timestamp::MAX_UTC,
        None => Timestamp::MIN_UTC,
    }
}
