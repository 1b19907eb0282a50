/// Listener registration methods
use super::core::EventDispatcher;
use crate::event::{Event, EventClass, Payload};
use crate::listener::{
    AsyncFnListener, ClassListener, FnListener, IntoListenerResult, ListenerEntry, ListenerSpec,
};
use std::collections::HashMap;
use std::future::Future;
use tracing::debug;

impl EventDispatcher {
    /// Registers a listener for an event name, class, interface or wildcard pattern.
    ///
    /// String listeners are class-based: `"Class"` calls `handle` (or the
    /// invocable form) and `"Class@method"` calls `method` on an instance
    /// resolved through the container at dispatch time.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use event_dispatcher::EventDispatcher;
    ///
    /// let events = EventDispatcher::new();
    /// events.listen("user.login", "App\\Listeners\\AuditLogin");
    /// events.listen("user.*", "App\\Listeners\\Metrics@record");
    /// assert!(events.has_listeners("user.login"));
    /// ```
    pub fn listen(&self, pattern: &str, listener: impl Into<ListenerSpec>) {
        let listener = listener.into();
        debug!("📝 Registered listener {} for {}", listener.describe(), pattern);
        self.shared.lock_registry().listen(pattern, listener);
    }

    /// Registers one listener under several patterns
    pub fn listen_many(&self, patterns: &[&str], listener: impl Into<ListenerSpec>) {
        let listener = listener.into();
        let mut registry = self.shared.lock_registry();
        for pattern in patterns {
            registry.listen(pattern, listener.clone());
        }
    }

    /// Registers a synchronous closure.
    ///
    /// The closure receives the event and the payload; its return value is
    /// the listener response (`()` for none, `false` to stop propagation).
    pub fn listen_fn<F, R>(&self, pattern: &str, listener: F)
    where
        F: Fn(&Event, &Payload) -> R + Send + Sync + 'static,
        R: IntoListenerResult + 'static,
    {
        self.listen(pattern, ListenerSpec::closure(FnListener::new(listener)));
    }

    /// Registers an async closure
    pub fn listen_async<F, Fut, R>(&self, pattern: &str, listener: F)
    where
        F: Fn(Event, Payload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoListenerResult + 'static,
    {
        self.listen(pattern, ListenerSpec::closure(AsyncFnListener::new(listener)));
    }

    /// Registers a closure for a typed event class; the class is the pattern.
    pub fn listen_class<E, F, R>(&self, listener: F)
    where
        E: EventClass,
        F: Fn(&E, &Payload) -> R + Send + Sync + 'static,
        R: IntoListenerResult + 'static,
    {
        self.listen(E::CLASS, ListenerSpec::closure(ClassListener::<E, F>::new(listener)));
    }

    /// Removes every listener registered under exactly `pattern`
    pub fn forget(&self, pattern: &str) {
        debug!("🗑️ Forgetting listeners for {}", pattern);
        self.shared.lock_registry().forget(pattern);
    }

    /// Listeners that would fire for `name`, in firing order
    pub fn get_listeners(&self, name: &str) -> Vec<ListenerEntry> {
        self.shared.lock_registry().get_listeners(name)
    }

    pub fn has_listeners(&self, name: &str) -> bool {
        self.shared.lock_registry().has_listeners(name)
    }

    pub fn has_wildcard_listeners(&self, name: &str) -> bool {
        self.shared.lock_registry().has_wildcard_listeners(name)
    }

    /// Every registered listener grouped by registration pattern
    pub fn raw_listeners(&self) -> HashMap<String, Vec<ListenerEntry>> {
        self.shared.lock_registry().raw_listeners()
    }
}
