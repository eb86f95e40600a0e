//! Logging facilities for Grouplist.
//!
//! Grouplist uses the `tracing` crate for instrumentation. To see logs,
//! install a tracing subscriber in your application:
//!
//! ```
//! tracing_subscriber::fmt()
//!     .with_env_filter("grouplist::diff=debug,grouplist::adapter=trace")
//!     .try_init()
//!     .ok();
//! ```

/// Span names used throughout Grouplist for tracing.
pub mod span_names {
    /// Diff computation span.
    pub const DIFF: &str = "grouplist::diff";
    /// Async update apply span.
    pub const APPLY: &str = "grouplist::apply";
}

/// Log targets, one per subsystem.
pub mod targets {
    /// Adapter mutations and observer translation.
    pub const ADAPTER: &str = "grouplist::adapter";
    /// Diff engine.
    pub const DIFF: &str = "grouplist::diff";
    /// Async diff controller.
    pub const ASYNC_DIFF: &str = "grouplist::async_diff";
    /// Group observer fan-in.
    pub const GROUP: &str = "grouplist::group";
    /// Signal/slot system.
    pub const SIGNAL: &str = "grouplist_core::signal";
    /// Executors and thread pools.
    pub const EXECUTOR: &str = "grouplist_core::executor";
}

/// Keeps an `info` span on `grouplist::perf` entered while alive.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Enter a span tagged with `operation = name`.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "grouplist::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perf_span() {
        let _span = PerfSpan::new(span_names::DIFF);
    }

    #[test]
    fn test_targets_are_namespaced() {
        for target in [targets::ADAPTER, targets::DIFF, targets::ASYNC_DIFF, targets::GROUP] {
            assert!(target.starts_with("grouplist::"));
        }
    }
}
