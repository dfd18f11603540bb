//! Error types for motion log operations.
//!
//! Both variants are contract violations by the caller and are reported
//! synchronously. An empty drain and a full log are not errors.

use thiserror::Error;

use crate::record::LogKind;

/// Errors returned by [`MotionLog`](crate::MotionLog) operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogError {
    /// Requested capacity outside `1..=max`.
    #[error("Invalid log capacity: {requested} (must be 1..={max})")]
    InvalidCapacity {
        /// Requested capacity.
        requested: usize,
        /// Hard maximum.
        max: usize,
    },

    /// Appended record does not match the configured kind.
    #[error("Record kind mismatch: log accepts {expected}, got {found}")]
    KindMismatch {
        /// Kind the log was initialized with.
        expected: LogKind,
        /// Kind of the rejected record.
        found: LogKind,
    },
}

/// Result type for motion log operations.
pub type LogResult<T> = Result<T, LogError>;
