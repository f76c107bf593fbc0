//! Helpers for tests that wait on timer notifications.

use std::time::Duration;
use tempo_core::Timestamp;
use tempo_ports::TimerReceiver;

/// Returns the next fire time if one arrives within `timeout`.
pub fn try_read(receiver: &TimerReceiver, timeout: Duration) -> Option<Timestamp> {
    receiver.recv_timeout(timeout).ok()
}
