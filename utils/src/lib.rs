//! Shared utilities for the polity simulation.

pub mod logging;
pub mod time;

pub use logging::init_tracing;
pub use time::{format_duration, format_until};
