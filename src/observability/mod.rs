//! Observability primitives for aliasd.
//!
//! The only facility the service carries is a leveled, structured logger.
//! It is a value handed to the subsystems that log, never a process-wide
//! global.

mod logger;

pub use logger::{Logger, Severity};
