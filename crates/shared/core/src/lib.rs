//! Tempo Core
//!
//! Pure time value types shared by every clock implementation.
//! This crate contains no locking, no I/O, and is 100% unit testable.

pub mod values;

// Re-export commonly used types at crate root
pub use values::{Duration, Timestamp, TimerId};
