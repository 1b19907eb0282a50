/// Explicit push/flush queue
use super::core::EventDispatcher;
use super::stats::StatsCounters;
use crate::error::DispatchError;
use crate::event::{Event, Payload};
use compact_str::CompactString;
use tracing::{debug, warn};

impl EventDispatcher {
    /// Stores an event to be dispatched by a later [`flush`](Self::flush).
    ///
    /// Nothing runs now. Entries are keyed by event name and kept in push
    /// order.
    pub fn push(&self, event: impl Into<Event>, payload: Payload) {
        let event = event.into();
        let key = CompactString::from(event.name());
        debug!("📥 Pushed {} for a later flush", key);

        self.scope
            .pushed
            .entry(key)
            .or_default()
            .push((event, payload));
        StatsCounters::bump(&self.shared.stats.pushed);
    }

    /// Dispatches every entry pushed under `name`, oldest first, and empties
    /// that key. Flushing an unknown key is a no-op.
    ///
    /// When a listener fails, the entries not yet dispatched go back to the
    /// front of the key's queue, ahead of anything pushed during the flush,
    /// and the error is returned.
    pub async fn flush(&self, name: &str) -> Result<(), DispatchError> {
        // the map shard lock is released before any listener runs
        let Some((key, entries)) = self.scope.pushed.remove(name) else {
            return Ok(());
        };

        debug!("📤 Flushing {} pushed {} events", entries.len(), name);
        let mut pending = entries.into_iter();
        while let Some((event, payload)) = pending.next() {
            StatsCounters::bump(&self.shared.stats.flushed);
            if let Err(error) = self.dispatch(event, payload).await {
                self.requeue(key, pending.collect());
                return Err(error);
            }
        }
        Ok(())
    }

    fn requeue(&self, key: CompactString, remaining: Vec<(Event, Payload)>) {
        if remaining.is_empty() {
            return;
        }

        warn!("⚠️ Flush of {} failed, keeping {} pushed events", key, remaining.len());
        let mut queue = self.scope.pushed.entry(key).or_default();
        let pushed_meanwhile = std::mem::replace(&mut *queue, remaining);
        queue.extend(pushed_meanwhile);
    }

    /// Drops every pushed entry without dispatching it
    pub fn forget_pushed(&self) {
        let dropped: usize = self.scope.pushed.iter().map(|entry| entry.len()).sum();
        self.scope.pushed.clear();
        if dropped > 0 {
            debug!("🗑️ Forgot {} pushed events", dropped);
        }
    }

    pub fn has_pushed(&self, name: &str) -> bool {
        self.scope
            .pushed
            .get(name)
            .is_some_and(|entries| !entries.is_empty())
    }
}
