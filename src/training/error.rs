//! Typed errors for the selection engine.
//!
//! Everything else in the binary uses `anyhow`; these are the failures a
//! caller is expected to match on and report per training run.

use thiserror::Error;

/// Errors raised by the ordering/picking engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SelectionError {
    /// The candidate pool cannot be partitioned into bins
    #[error("Invalid candidate pool: {0}")]
    InvalidPool(String),

    /// A strategy name that no registered implementation answers to
    #[error("Unknown {kind} strategy '{name}'")]
    UnknownStrategy { kind: &'static str, name: String },
}
