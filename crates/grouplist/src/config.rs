//! Adapter configuration.

use crate::error::{AdapterError, Result};

/// Configuration for a [`GroupAdapter`](crate::GroupAdapter).
///
/// # Example
///
/// ```
/// use grouplist::AdapterConfig;
///
/// let config = AdapterConfig::default()
///     .with_span_count(3)
///     .with_detect_moves(false);
/// assert_eq!(config.span_count, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterConfig {
    /// Number of grid columns. Must be at least 1.
    pub span_count: usize,
    /// Whether bulk updates detect moves unless told otherwise.
    pub detect_moves: bool,
    /// Keep owning-thread checks in release builds.
    pub strict_thread_checks: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            span_count: 1,
            detect_moves: true,
            strict_thread_checks: false,
        }
    }
}

impl AdapterConfig {
    /// Set the number of grid columns.
    pub fn with_span_count(mut self, span_count: usize) -> Self {
        self.span_count = span_count;
        self
    }

    /// Set the default for move detection.
    pub fn with_detect_moves(mut self, detect_moves: bool) -> Self {
        self.detect_moves = detect_moves;
        self
    }

    /// Keep owning-thread checks in release builds.
    pub fn with_strict_thread_checks(mut self, strict: bool) -> Self {
        self.strict_thread_checks = strict;
        self
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.span_count == 0 {
            return Err(AdapterError::InvalidArgument(
                "span count must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
