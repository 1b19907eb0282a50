//! Listener specifications and closure adapters

use crate::container::ListenerTarget;
use crate::error::DispatchError;
use crate::event::{Event, EventClass, Payload};
use async_trait::async_trait;
use compact_str::CompactString;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// A listener that can be invoked directly, without container resolution.
#[async_trait]
pub trait Listener: Send + Sync {
    /// Handle an event. `Ok(None)` means the listener produced no response.
    async fn handle(&self, event: &Event, payload: &Payload) -> Result<Option<Value>, DispatchError>;
}

/// Conversion of listener return values into a dispatch response.
///
/// `Value::Null` is normalised to "no response" so halting dispatch treats
/// it like a listener that returned nothing.
pub trait IntoListenerResult {
    fn into_listener_result(self) -> Result<Option<Value>, DispatchError>;
}

impl IntoListenerResult for () {
    fn into_listener_result(self) -> Result<Option<Value>, DispatchError> {
        Ok(None)
    }
}

impl IntoListenerResult for Value {
    fn into_listener_result(self) -> Result<Option<Value>, DispatchError> {
        Ok(match self {
            Value::Null => None,
            value => Some(value),
        })
    }
}

impl IntoListenerResult for Option<Value> {
    fn into_listener_result(self) -> Result<Option<Value>, DispatchError> {
        Ok(self.filter(|value| !value.is_null()))
    }
}

impl IntoListenerResult for bool {
    fn into_listener_result(self) -> Result<Option<Value>, DispatchError> {
        Ok(Some(Value::Bool(self)))
    }
}

impl IntoListenerResult for String {
    fn into_listener_result(self) -> Result<Option<Value>, DispatchError> {
        Ok(Some(Value::String(self)))
    }
}

impl<T: IntoListenerResult> IntoListenerResult for Result<T, DispatchError> {
    fn into_listener_result(self) -> Result<Option<Value>, DispatchError> {
        self.and_then(IntoListenerResult::into_listener_result)
    }
}

/// Adapter for synchronous closures `Fn(&Event, &Payload) -> R`
pub struct FnListener<F> {
    f: F,
}

impl<F> FnListener<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, R> Listener for FnListener<F>
where
    F: Fn(&Event, &Payload) -> R + Send + Sync,
    R: IntoListenerResult + 'static,
{
    async fn handle(&self, event: &Event, payload: &Payload) -> Result<Option<Value>, DispatchError> {
        (self.f)(event, payload).into_listener_result()
    }
}

/// Adapter for async closures `Fn(Event, Payload) -> impl Future<Output = R>`
pub struct AsyncFnListener<F> {
    f: F,
}

impl<F> AsyncFnListener<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut, R> Listener for AsyncFnListener<F>
where
    F: Fn(Event, Payload) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoListenerResult + 'static,
{
    async fn handle(&self, event: &Event, payload: &Payload) -> Result<Option<Value>, DispatchError> {
        (self.f)(event.clone(), payload.clone())
            .await
            .into_listener_result()
    }
}

/// Adapter for closures bound to a typed event class.
///
/// The closure only runs when the dispatched event really is an `E`.
pub struct ClassListener<E, F> {
    f: F,
    _event: PhantomData<fn(&E)>,
}

impl<E, F> ClassListener<E, F> {
    pub fn new(f: F) -> Self {
        Self {
            f,
            _event: PhantomData,
        }
    }
}

#[async_trait]
impl<E, F, R> Listener for ClassListener<E, F>
where
    E: EventClass,
    F: Fn(&E, &Payload) -> R + Send + Sync,
    R: IntoListenerResult + 'static,
{
    async fn handle(&self, event: &Event, payload: &Payload) -> Result<Option<Value>, DispatchError> {
        match event.downcast_ref::<E>() {
            Some(typed) => (self.f)(typed, payload).into_listener_result(),
            None => Ok(None),
        }
    }
}

/// How a registered listener is reached at dispatch time.
#[derive(Clone)]
pub enum ListenerSpec {
    /// Directly callable listener
    Closure(Arc<dyn Listener>),
    /// `"Class@method"`: resolve `class` through the container, call `method`
    ClassMethod {
        class: CompactString,
        method: CompactString,
    },
    /// `"Class"`: resolve through the container, call `handle` or invoke it
    ClassDefaultHandle { class: CompactString },
    /// An already-built target plus the method to call on it
    ArrayCallable {
        target: Arc<dyn ListenerTarget>,
        method: CompactString,
    },
}

impl ListenerSpec {
    /// Parse a string listener: `"Class@method"` or a bare `"Class"`
    pub fn parse(listener: &str) -> Self {
        match listener.split_once('@') {
            Some((class, method)) if !method.is_empty() => ListenerSpec::ClassMethod {
                class: CompactString::new(class),
                method: CompactString::new(method),
            },
            Some((class, _)) => ListenerSpec::ClassDefaultHandle {
                class: CompactString::new(class),
            },
            None => ListenerSpec::ClassDefaultHandle {
                class: CompactString::new(listener),
            },
        }
    }

    /// Wrap a directly-callable listener
    pub fn closure<L: Listener + 'static>(listener: L) -> Self {
        ListenerSpec::Closure(Arc::new(listener))
    }

    /// Call `method` on an existing target
    pub fn method(target: Arc<dyn ListenerTarget>, method: &str) -> Self {
        ListenerSpec::ArrayCallable {
            target,
            method: CompactString::new(method),
        }
    }

    /// Raw, human-readable form of the listener as it was registered
    pub fn describe(&self) -> String {
        match self {
            ListenerSpec::Closure(_) => "Closure".to_string(),
            ListenerSpec::ClassMethod { class, method } => format!("{class}@{method}"),
            ListenerSpec::ClassDefaultHandle { class } => class.to_string(),
            ListenerSpec::ArrayCallable { target, method } => {
                format!("{}::{}", target.class_name(), method)
            }
        }
    }

    /// Whether dispatching this listener needs a container
    pub fn needs_container(&self) -> bool {
        matches!(
            self,
            ListenerSpec::ClassMethod { .. } | ListenerSpec::ClassDefaultHandle { .. }
        )
    }
}

impl fmt::Debug for ListenerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ListenerSpec").field(&self.describe()).finish()
    }
}

impl From<&str> for ListenerSpec {
    fn from(listener: &str) -> Self {
        ListenerSpec::parse(listener)
    }
}

impl From<String> for ListenerSpec {
    fn from(listener: String) -> Self {
        ListenerSpec::parse(&listener)
    }
}

impl From<Arc<dyn Listener>> for ListenerSpec {
    fn from(listener: Arc<dyn Listener>) -> Self {
        ListenerSpec::Closure(listener)
    }
}

/// A listener as stored in the registry, with the pattern it was registered under.
#[derive(Debug, Clone)]
pub struct ListenerEntry {
    pub pattern: CompactString,
    pub listener: ListenerSpec,
}

impl ListenerEntry {
    pub fn new(pattern: &str, listener: ListenerSpec) -> Self {
        Self {
            pattern: CompactString::new(pattern),
            listener,
        }
    }
}
