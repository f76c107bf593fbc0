use chrono::{DateTime, Utc};
use std::fmt;

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;

/// Signed duration with nanosecond resolution.
/// Zero and negative values are meaningful: they schedule an immediate fire.
pub use chrono::Duration;

/// Stable identity of a timer inside its clock's registry
///
/// Allocated from a per-clock counter and never reused by that clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_id_display() {
        assert_eq!(TimerId::new(7).to_string(), "timer#7");
    }

    #[test]
    fn test_timer_id_ordering() {
        let a = TimerId::new(1);
        let b = TimerId::new(2);
        assert!(a < b);
        assert_ne!(a, b);
    }

    #[test]
    fn test_negative_duration_is_expressible() {
        let d = Duration::nanoseconds(-1);
        assert!(d < Duration::zero());
    }
}
