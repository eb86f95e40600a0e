//! Error types for Grouplist runtime support.

use std::fmt;

/// Errors raised when work cannot be handed to an [`Executor`](crate::Executor).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    /// The executor has been shut down and accepts no further tasks.
    ShutDown,
    /// Failed to create the underlying worker threads.
    CreationFailed(String),
    /// The executor refused the task for another reason.
    Rejected(String),
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShutDown => write!(f, "Executor has been shut down"),
            Self::CreationFailed(msg) => write!(f, "Failed to create executor: {msg}"),
            Self::Rejected(msg) => write!(f, "Executor rejected task: {msg}"),
        }
    }
}

impl std::error::Error for ExecutorError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_error_display() {
        assert_eq!(ExecutorError::ShutDown.to_string(), "Executor has been shut down");
        assert_eq!(
            ExecutorError::Rejected("queue full".into()).to_string(),
            "Executor rejected task: queue full"
        );
    }
}
