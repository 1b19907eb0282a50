/// Statistics tracking for the dispatcher
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of dispatcher activity since construction.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherStats {
    /// Number of registered listeners
    pub total_listeners: usize,
    /// Dispatch calls whose listeners actually ran
    pub events_dispatched: u64,
    /// Dispatch calls buffered by a deferral context
    pub events_deferred: u64,
    /// Dispatch calls handed to a transaction manager
    pub events_after_commit: u64,
    /// Events stored with `push`
    pub events_pushed: u64,
    /// Pushed events dispatched by `flush`
    pub events_flushed: u64,
    /// Individual listener invocations
    pub listeners_invoked: u64,
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    pub(crate) dispatched: AtomicU64,
    pub(crate) deferred: AtomicU64,
    pub(crate) after_commit: AtomicU64,
    pub(crate) pushed: AtomicU64,
    pub(crate) flushed: AtomicU64,
    pub(crate) listeners_invoked: AtomicU64,
}

impl StatsCounters {
    #[inline]
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, total_listeners: usize) -> DispatcherStats {
        DispatcherStats {
            total_listeners,
            events_dispatched: self.dispatched.load(Ordering::Relaxed),
            events_deferred: self.deferred.load(Ordering::Relaxed),
            events_after_commit: self.after_commit.load(Ordering::Relaxed),
            events_pushed: self.pushed.load(Ordering::Relaxed),
            events_flushed: self.flushed.load(Ordering::Relaxed),
            listeners_invoked: self.listeners_invoked.load(Ordering::Relaxed),
        }
    }
}
