//! Error types for the list adapter.

use grouplist_core::ExecutorError;
use thiserror::Error;

/// Errors returned by adapter, group and flattener operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// A flat (or group-local) item position is outside `0..len`.
    #[error("requested position {index} but there are only {len} items")]
    OutOfRange {
        /// The requested position.
        index: usize,
        /// The number of items available.
        len: usize,
    },

    /// A group index is outside `0..len`.
    #[error("requested group index {index} but there are only {len} groups")]
    GroupOutOfRange {
        /// The requested group index.
        index: usize,
        /// The number of groups available.
        len: usize,
    },

    /// An argument was rejected, e.g. removing a group that is not present.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No item in the list has the requested view type.
    #[error("could not find an item for view type {0}")]
    UnknownViewType(i32),

    /// The executor refused to accept a diff computation.
    #[error("scheduler unavailable: {0}")]
    SchedulerUnavailable(#[from] ExecutorError),

    /// The diff computation failed on its worker.
    #[error("diff computation failed: {0}")]
    DiffFailed(String),
}

/// Result type for adapter operations.
pub type Result<T> = std::result::Result<T, AdapterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AdapterError::OutOfRange { index: 5, len: 3 };
        assert_eq!(err.to_string(), "requested position 5 but there are only 3 items");

        let err: AdapterError = ExecutorError::ShutDown.into();
        assert_eq!(
            err.to_string(),
            "scheduler unavailable: Executor has been shut down"
        );
    }
}
