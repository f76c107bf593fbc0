//! Tempo Clock
//!
//! Substitutable time for code that schedules future work.
//!
//! ## Clocks
//!
//! ```text
//! Clock (port: now + new_timer)
//!     │
//!     ├── SystemClock      wall-clock time, timers wait on real time
//!     │
//!     └── SimulatedClock   frozen until advanced, timers fire synchronously
//!             │
//!             └── TimerRegistry (one lock: current time + every timer's state)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use tempo_clock::{Clock, SimulatedClock, Timer};
//! use chrono::Duration;
//!
//! // Application code only sees the port
//! fn schedule(clock: &dyn Clock) -> Box<dyn Timer> {
//!     clock.new_timer(Duration::minutes(5))
//! }
//!
//! // Tests drive time by hand
//! let clock = SimulatedClock::new(start);
//! let timer = schedule(&clock);
//! clock.advance(Duration::minutes(5));        // fires, synchronously
//! assert_eq!(timer.receiver().try_recv()?, start + Duration::minutes(5));
//! ```

pub mod config;
mod registry;
mod simulated;
mod system;
pub mod testutil;

pub use config::{ClockConfig, ClockHandle, ConfigError, ConfigResult};
pub use simulated::{SimulatedClock, SimulatedTimer};
pub use system::{SystemClock, SystemTimer};

// Re-export the ports and value types for convenience
pub use tempo_core::{Duration, Timestamp};
pub use tempo_ports::{Clock, Timer, TimerReceiver};
