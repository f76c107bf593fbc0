use crossbeam_channel::Receiver;
use tempo_core::{Duration, Timestamp};

/// Receive side of a timer's fire notifications.
///
/// Always created with a capacity of one: at most one fire is pending.
pub type TimerReceiver = Receiver<Timestamp>;

/// Port for a single-shot, resettable timer
pub trait Timer: Send + Sync {
    /// Re-arm the timer to fire `duration` after the owning clock's current time
    ///
    /// Returns whether the timer was armed before the call.
    fn reset(&self, duration: Duration) -> bool;

    /// Disarm the timer
    ///
    /// Returns whether the timer was armed before the call. A notification
    /// already sitting in the receiver is not drained.
    fn stop(&self) -> bool;

    /// Fire notifications, each carrying the time the timer fired at
    fn receiver(&self) -> &TimerReceiver;
}
