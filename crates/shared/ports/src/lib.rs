//! Tempo Ports
//!
//! Port definitions (traits) for time.
//! These define the boundary between code that schedules work and the
//! source of time it runs against: real time in production, simulated
//! time in tests.

mod clock;
mod timer;

pub use clock::Clock;
pub use timer::{Timer, TimerReceiver};
