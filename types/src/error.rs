//! Top-level error type shared across crates.

use thiserror::Error;

/// Common error type for the polity simulation.
#[derive(Debug, Error)]
pub enum PolityError {
    /// A persisted enum code does not name any known variant. Codes are only
    /// produced by this program, so an unknown one is a programming error.
    #[error("unknown {kind} code: {code}")]
    UnknownCode { kind: &'static str, code: u8 },

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("{0}")]
    Other(String),
}
