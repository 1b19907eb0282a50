/// Dispatch methods
use super::core::{EventDispatcher, Shared};
use super::stats::StatsCounters;
use crate::container::LazyListenerResolver;
use crate::error::DispatchError;
use crate::event::{Event, Payload, Response};
use crate::listener::ListenerEntry;
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, trace, warn};

impl EventDispatcher {
    /// Dispatches an event to every matching listener.
    ///
    /// Listeners run in registration order: direct listeners, listeners for
    /// each interface the event declares, wildcard listeners, then `*`. A
    /// listener returning exactly `false` stops propagation; other falsy
    /// values do not. Returns [`Response::Event`] with the dispatched event,
    /// or [`Response::Deferred`] when the event was buffered.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use event_dispatcher::{payload, EventDispatcher};
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let events = EventDispatcher::new();
    /// events.listen_fn("user.login", |_event, payload| {
    ///     println!("{} logged in", payload[0]);
    /// });
    ///
    /// let response = events.dispatch("user.login", payload!["taylor"]).await.unwrap();
    /// assert_eq!(response.event_name(), Some("user.login"));
    /// # }
    /// ```
    pub fn dispatch(
        &self,
        event: impl Into<Event>,
        payload: Payload,
    ) -> BoxFuture<'_, Result<Response, DispatchError>> {
        self.dispatch_with(event, payload, false)
    }

    /// Dispatches until the first listener returns a non-null response.
    ///
    /// Returns [`Response::Value`] with that response, or [`Response::Null`]
    /// when no listener produced one.
    pub fn until(
        &self,
        event: impl Into<Event>,
        payload: Payload,
    ) -> BoxFuture<'_, Result<Response, DispatchError>> {
        self.dispatch_with(event, payload, true)
    }

    /// Dispatch with explicit halting behaviour
    pub fn dispatch_with(
        &self,
        event: impl Into<Event>,
        payload: Payload,
        halt: bool,
    ) -> BoxFuture<'_, Result<Response, DispatchError>> {
        let event = event.into();
        async move {
            if self.buffer_if_deferring(&event, &payload) {
                StatsCounters::bump(&self.shared.stats.deferred);
                trace!("⏸️ Deferred {}", event.name());
                return Ok(Response::Deferred);
            }

            if event.should_dispatch_after_commit() {
                if let Some(transactions) = self.transaction_manager() {
                    StatsCounters::bump(&self.shared.stats.after_commit);
                    debug!("🔒 {} will dispatch after commit", event.name());
                    let shared = Arc::clone(&self.shared);
                    transactions.add_callback(Box::new(move || {
                        async move {
                            let listeners = shared.listeners_for(&event);
                            shared
                                .invoke_listeners(&event, &payload, listeners, halt)
                                .await
                                .map(|_| ())
                        }
                        .boxed()
                    }));
                    return Ok(Response::Deferred);
                }
            }

            let listeners = self.shared.listeners_for(&event);
            self.shared
                .invoke_listeners(&event, &payload, listeners, halt)
                .await
        }
        .boxed()
    }
}

impl Shared {
    /// Run a snapshot of listeners against one event.
    ///
    /// Listener errors abort the loop and propagate unchanged.
    pub(super) async fn invoke_listeners(
        &self,
        event: &Event,
        payload: &Payload,
        listeners: Vec<ListenerEntry>,
        halt: bool,
    ) -> Result<Response, DispatchError> {
        StatsCounters::bump(&self.stats.dispatched);

        if listeners.is_empty() {
            if self.config.warn_unhandled {
                warn!("⚠️ No listeners for event: {}", event.name());
            }
        } else {
            debug!("📤 Dispatching {} to {} listeners", event.name(), listeners.len());
        }

        let resolver = LazyListenerResolver::new(self.container());

        for entry in &listeners {
            let response = resolver.call(entry, event, payload).await?;
            StatsCounters::bump(&self.stats.listeners_invoked);

            if halt {
                if let Some(value) = response {
                    trace!("Halted {} at listener {}", event.name(), entry.listener.describe());
                    return Ok(Response::Value(value));
                }
                continue;
            }

            if matches!(response, Some(Value::Bool(false))) {
                trace!(
                    "Propagation of {} stopped by {}",
                    event.name(),
                    entry.listener.describe()
                );
                break;
            }
        }

        if halt {
            Ok(Response::Null)
        } else {
            Ok(Response::Event(event.clone()))
        }
    }
}
