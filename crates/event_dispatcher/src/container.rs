//! Container resolution of class-based listeners

use crate::error::DispatchError;
use crate::event::{Event, Payload};
use crate::listener::{ListenerEntry, ListenerSpec};
use async_trait::async_trait;
use compact_str::CompactString;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::trace;

/// Method called on class listeners registered without an explicit method.
pub const DEFAULT_METHOD: &str = "handle";

/// A resolved listener instance.
///
/// Implementations expose the methods a `"Class@method"` listener may name.
/// An implementation with no `handle` method can still be registered as a bare
/// class listener if it is invocable.
#[async_trait]
pub trait ListenerTarget: Send + Sync {
    /// Class name, used in diagnostics
    fn class_name(&self) -> &str;

    /// Whether `method` can be passed to [`ListenerTarget::call`]
    fn has_method(&self, method: &str) -> bool;

    /// Call a named method
    async fn call(
        &self,
        method: &str,
        event: &Event,
        payload: &Payload,
    ) -> Result<Option<Value>, DispatchError>;

    /// Whether the target can be called without naming a method
    fn is_invocable(&self) -> bool {
        false
    }

    /// Call the target itself
    async fn invoke(&self, _event: &Event, _payload: &Payload) -> Result<Option<Value>, DispatchError> {
        Err(DispatchError::InvalidCallable {
            class: self.class_name().to_string(),
            method: None,
        })
    }
}

/// Dependency resolver used to build class-based listeners.
///
/// `resolve` is called every time a class listener is about to run, so a
/// container that builds fresh instances gives one instance per dispatch.
pub trait Container: Send + Sync {
    fn resolve(&self, class: &str) -> Result<Arc<dyn ListenerTarget>, DispatchError>;
}

type Factory = Arc<dyn Fn() -> Arc<dyn ListenerTarget> + Send + Sync>;

/// Container backed by per-class factory closures.
#[derive(Default)]
pub struct ServiceContainer {
    factories: RwLock<HashMap<CompactString, Factory>>,
}

impl ServiceContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a factory that builds a new instance for every resolution
    pub fn bind<F>(&self, class: &str, factory: F)
    where
        F: Fn() -> Arc<dyn ListenerTarget> + Send + Sync + 'static,
    {
        self.factories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(CompactString::new(class), Arc::new(factory));
    }

    pub fn is_bound(&self, class: &str) -> bool {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(class)
    }
}

impl std::fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bindings = self
            .factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("ServiceContainer")
            .field("bindings", &bindings)
            .finish()
    }
}

impl Container for ServiceContainer {
    fn resolve(&self, class: &str) -> Result<Arc<dyn ListenerTarget>, DispatchError> {
        let factory = self
            .factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(class)
            .cloned()
            .ok_or_else(|| DispatchError::ListenerNotBound(class.to_string()))?;
        Ok(factory())
    }
}

/// Turns a registered listener into a call, at the moment it is needed.
///
/// Nothing is resolved at registration time and nothing is cached between
/// calls: each call on a class listener resolves a new target.
pub struct LazyListenerResolver {
    container: Option<Arc<dyn Container>>,
}

impl LazyListenerResolver {
    pub fn new(container: Option<Arc<dyn Container>>) -> Self {
        Self { container }
    }

    /// Resolve and invoke one listener
    pub async fn call(
        &self,
        entry: &ListenerEntry,
        event: &Event,
        payload: &Payload,
    ) -> Result<Option<Value>, DispatchError> {
        let response = match &entry.listener {
            ListenerSpec::Closure(listener) => listener.handle(event, payload).await?,
            ListenerSpec::ClassDefaultHandle { class } => {
                let target = self.make(class)?;
                if target.has_method(DEFAULT_METHOD) {
                    target.call(DEFAULT_METHOD, event, payload).await?
                } else if target.is_invocable() {
                    target.invoke(event, payload).await?
                } else {
                    return Err(DispatchError::InvalidCallable {
                        class: class.to_string(),
                        method: None,
                    });
                }
            }
            ListenerSpec::ClassMethod { class, method } => {
                let target = self.make(class)?;
                Self::call_method(target.as_ref(), method, event, payload).await?
            }
            ListenerSpec::ArrayCallable { target, method } => {
                Self::call_method(target.as_ref(), method, event, payload).await?
            }
        };
        Ok(response.filter(|value| !value.is_null()))
    }

    fn make(&self, class: &str) -> Result<Arc<dyn ListenerTarget>, DispatchError> {
        let container = self
            .container
            .as_ref()
            .ok_or_else(|| DispatchError::ContainerMissing(class.to_string()))?;
        trace!("Resolving listener class {}", class);
        container.resolve(class)
    }

    async fn call_method(
        target: &dyn ListenerTarget,
        method: &str,
        event: &Event,
        payload: &Payload,
    ) -> Result<Option<Value>, DispatchError> {
        if !target.has_method(method) {
            return Err(DispatchError::InvalidCallable {
                class: target.class_name().to_string(),
                method: Some(method.to_string()),
            });
        }
        target.call(method, event, payload).await
    }
}
