/// Deferral contexts
use super::core::{EventDispatcher, Scope};
use crate::error::DispatchError;
use crate::event::{Event, Payload};
use compact_str::CompactString;
use std::collections::HashSet;
use std::future::Future;
use tracing::{debug, trace};

/// One entry of a scope's deferral stack, innermost last.
#[derive(Debug)]
pub(super) enum DeferralFrame {
    /// A `defer` body is running; matching dispatches are buffered here.
    Deferring {
        /// `None` buffers every event
        filter: Option<HashSet<CompactString>>,
        buffered: Vec<(Event, Payload)>,
    },
    /// A finished context is replaying its buffer. Dispatches made while this
    /// frame is on top run immediately instead of landing in an outer buffer.
    Flushing,
}

impl DeferralFrame {
    fn accepts(&self, event: &Event) -> bool {
        match self {
            DeferralFrame::Deferring { filter: None, .. } => true,
            DeferralFrame::Deferring {
                filter: Some(names),
                ..
            } => names.contains(event.name()),
            DeferralFrame::Flushing => false,
        }
    }

    pub(super) fn is_deferring(&self) -> bool {
        matches!(self, DeferralFrame::Deferring { .. })
    }
}

/// Pops a frame (and anything above it) when dropped, so a failing or
/// cancelled body never leaves its context on the stack.
struct FrameGuard<'a> {
    scope: &'a Scope,
    depth: usize,
}

impl<'a> FrameGuard<'a> {
    fn push(scope: &'a Scope, frame: DeferralFrame, limit: usize) -> Result<Self, DispatchError> {
        let mut frames = scope.lock_frames();
        if frame.is_deferring() && open_contexts(&frames) >= limit {
            return Err(DispatchError::DeferDepthExceeded(limit));
        }
        frames.push(frame);
        Ok(Self {
            scope,
            depth: frames.len() - 1,
        })
    }

    /// Pops the guarded frame and hands back whatever it buffered.
    fn release(self) -> Vec<(Event, Payload)> {
        let mut frames = self.scope.lock_frames();
        let frame = if self.depth < frames.len() {
            frames.drain(self.depth..).next()
        } else {
            None
        };
        drop(frames);

        match frame {
            Some(DeferralFrame::Deferring { buffered, .. }) => buffered,
            _ => Vec::new(),
        }
    }
}

/// Deferral contexts on the stack; flush markers are not counted.
pub(super) fn open_contexts(frames: &[DeferralFrame]) -> usize {
    frames.iter().filter(|frame| frame.is_deferring()).count()
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        self.scope.lock_frames().truncate(self.depth);
    }
}

impl EventDispatcher {
    /// Runs `body` with every dispatch buffered, then replays the buffer in
    /// order once `body` succeeds.
    ///
    /// Contexts nest: an inner context flushes as soon as its own body
    /// returns, while the outer one is still collecting. If `body` fails the
    /// buffered events are dropped and the error is returned unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use event_dispatcher::{payload, DispatchError, EventDispatcher};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), DispatchError> {
    /// let events = EventDispatcher::new();
    /// events.listen_fn("order.placed", |_event, _payload| {});
    ///
    /// let total = events
    ///     .defer(|| async {
    ///         events.dispatch("order.placed", payload![1]).await?;
    ///         assert!(events.stats().events_dispatched == 0);
    ///         Ok::<_, DispatchError>(42)
    ///     })
    ///     .await?;
    ///
    /// assert_eq!(total, 42);
    /// assert_eq!(events.stats().events_dispatched, 1);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn defer<F, Fut, T, E>(&self, body: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<DispatchError>,
    {
        self.run_deferred(None, body).await
    }

    /// Like [`defer`](Self::defer), but only buffers the named events; any
    /// other dispatch inside `body` runs immediately.
    pub async fn defer_only<I, S, F, Fut, T, E>(&self, events: I, body: F) -> Result<T, E>
    where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<DispatchError>,
    {
        let filter = events.into_iter().map(Into::into).collect();
        self.run_deferred(Some(filter), body).await
    }

    async fn run_deferred<F, Fut, T, E>(
        &self,
        filter: Option<HashSet<CompactString>>,
        body: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<DispatchError>,
    {
        let frame = DeferralFrame::Deferring {
            filter,
            buffered: Vec::new(),
        };
        let guard = FrameGuard::push(&self.scope, frame, self.shared.config.max_defer_depth)?;
        trace!("⏸️ Entered deferral context at stack position {}", guard.depth);

        let result = body().await;
        let buffered = guard.release();

        let value = match result {
            Ok(value) => value,
            Err(error) => {
                if !buffered.is_empty() {
                    debug!("🗑️ Discarding {} deferred events after failure", buffered.len());
                }
                return Err(error);
            }
        };

        self.flush_deferred(buffered).await?;
        Ok(value)
    }

    async fn flush_deferred(&self, buffered: Vec<(Event, Payload)>) -> Result<(), DispatchError> {
        if buffered.is_empty() {
            return Ok(());
        }

        debug!("▶️ Flushing {} deferred events", buffered.len());
        let _flushing = FrameGuard::push(&self.scope, DeferralFrame::Flushing, usize::MAX)?;

        for (event, payload) in buffered {
            self.dispatch(event, payload).await?;
        }
        Ok(())
    }

    /// Buffers the event in the innermost deferral context when that context
    /// accepts it. Returns whether the event was buffered.
    pub(super) fn buffer_if_deferring(&self, event: &Event, payload: &Payload) -> bool {
        let mut frames = self.scope.lock_frames();
        match frames.last_mut() {
            Some(frame) if frame.accepts(event) => {
                if let DeferralFrame::Deferring { buffered, .. } = frame {
                    buffered.push((event.clone(), payload.clone()));
                }
                true
            }
            _ => false,
        }
    }
}
