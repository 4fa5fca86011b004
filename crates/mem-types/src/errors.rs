//! # Error Types
//!
//! The error taxonomy shared across the memctl crates.

use thiserror::Error;

use crate::entities::{BlockId, BlockState};

/// Errors surfaced by memory block and region operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MemError {
    /// An attribute path was missing or unreadable.
    #[error("Resource unavailable: {path}: {reason}")]
    ResourceUnavailable { path: String, reason: String },

    /// A disallowed state change was attempted. Online-to-online
    /// transitions must pass through Offline.
    #[error("Invalid transition for block {id}: {from} -> {to}")]
    InvalidTransition {
        id: BlockId,
        from: BlockState,
        to: BlockState,
    },

    /// A bulk operation where some items succeeded and some failed.
    /// Only the aggregate count is reported.
    #[error("Partial failure: {failed} of {total} blocks failed")]
    PartialFailure { failed: usize, total: usize },

    /// The external topology reported a sentinel or impossible value.
    #[error("Configuration inconsistency: {0}")]
    ConfigurationInconsistency(String),

    /// An attribute write returned fewer bytes than expected.
    #[error("Write verification failed for {path}: wrote {written} of {expected} bytes")]
    WriteVerification {
        path: String,
        expected: usize,
        written: usize,
    },

    /// The caller passed a policy or granularity outside the valid range.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A block, region, decoder, or device lookup found nothing.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Attribute contents that map to no known enum value.
    #[error("Unparseable attribute value in {path}: {value:?}")]
    Unparseable { path: String, value: String },
}

impl MemError {
    /// Shorthand for the common unreadable-path case.
    pub fn unavailable(path: impl Into<String>, reason: impl ToString) -> Self {
        MemError::ResourceUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
