//! Progress notifications and cooperative cancellation.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Named phase of an ordering run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Building the VP-tree.
    IndexBuild,
    /// Querying k nearest neighbors for every item.
    GraphBuild,
    /// Growing the spanning tree with Prim's algorithm.
    MstBuild,
    /// Walking the spanning tree (or the tree index) to emit the order.
    Traversal,
    /// Simple greedy placement.
    Ordering,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::IndexBuild => "index_build",
            Phase::GraphBuild => "graph_build",
            Phase::MstBuild => "mst_build",
            Phase::Traversal => "traversal",
            Phase::Ordering => "ordering",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single progress notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub phase: Phase,
    pub current: usize,
    pub total: usize,
}

/// Receiver of progress notifications.
///
/// Reports are fire-and-forget: implementations must not block, and the
/// engine never waits on them.
pub trait ProgressSink {
    fn report(&self, progress: Progress);
}

/// Discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _progress: Progress) {}
}

impl<F> ProgressSink for F
where
    F: Fn(Progress),
{
    fn report(&self, progress: Progress) {
        self(progress)
    }
}

/// Shared cancellation flag.
///
/// Cloning shares the flag. Setting it from any thread is observed by the
/// engine at its next checkpoint.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn cancel_is_shared_between_clones() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn closures_are_sinks() {
        let seen = RefCell::new(Vec::new());
        let sink = |p: Progress| seen.borrow_mut().push(p.phase);
        sink.report(Progress {
            phase: Phase::MstBuild,
            current: 1,
            total: 2,
        });
        assert_eq!(*seen.borrow(), vec![Phase::MstBuild]);
    }

    #[test]
    fn phase_names_are_snake_case() {
        assert_eq!(Phase::IndexBuild.to_string(), "index_build");
        assert_eq!(Phase::Traversal.as_str(), "traversal");
    }
}
