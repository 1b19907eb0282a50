//! Event values, payloads and dispatch responses

use compact_str::CompactString;
use serde_json::Value;
use smallvec::SmallVec;
use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

/// Arguments handed to every listener together with the event.
pub type Payload = Vec<Value>;

/// Capability tags of an event: its name first, then declared interfaces.
pub type EventTags = SmallVec<[&'static str; 4]>;

/// Trait implemented by typed event objects.
///
/// The class name and interface names are the lookup keys listeners are
/// registered under. Use [`impl_event!`](crate::impl_event) rather than
/// implementing this by hand.
pub trait EventObject: Any + Send + Sync + Debug {
    /// Concrete class name of the event
    fn class_name(&self) -> &'static str;

    /// Interface names the event declares, in declaration order
    fn interfaces(&self) -> &'static [&'static str] {
        &[]
    }

    /// Whether listeners should only run once the surrounding transaction commits
    fn dispatch_after_commit(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any;
}

/// Event objects whose class name is known without an instance.
pub trait EventClass: EventObject {
    const CLASS: &'static str;
}

/// An event as seen by the dispatcher: a plain name or a typed object.
#[derive(Debug, Clone)]
pub enum Event {
    Named(CompactString),
    Object(Arc<dyn EventObject>),
}

impl Event {
    /// Create a string-named event
    pub fn named(name: &str) -> Self {
        Event::Named(CompactString::new(name))
    }

    /// Wrap a typed event object
    pub fn object<T: EventObject>(event: T) -> Self {
        Event::Object(Arc::new(event))
    }

    /// The name used for direct lookup, deferral filters and the push queue
    pub fn name(&self) -> &str {
        match self {
            Event::Named(name) => name.as_str(),
            Event::Object(object) => object.class_name(),
        }
    }

    /// Every key listeners for this event may be registered under.
    ///
    /// Named events only carry their name, which is returned through
    /// [`Event::name`] instead; this is empty for them.
    pub fn interface_tags(&self) -> EventTags {
        match self {
            Event::Named(_) => SmallVec::new(),
            Event::Object(object) => {
                let mut tags = EventTags::new();
                tags.push(object.class_name());
                tags.extend(object.interfaces().iter().copied());
                tags
            }
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Event::Object(_))
    }

    pub fn should_dispatch_after_commit(&self) -> bool {
        match self {
            Event::Named(_) => false,
            Event::Object(object) => object.dispatch_after_commit(),
        }
    }

    /// Borrow the typed event object, if this event carries one of type `T`
    pub fn downcast_ref<T: EventObject>(&self) -> Option<&T> {
        match self {
            Event::Named(_) => None,
            Event::Object(object) => object.as_any().downcast_ref::<T>(),
        }
    }

    /// True when both events are the same object instance, or equal names
    pub fn same_as(&self, other: &Event) -> bool {
        match (self, other) {
            (Event::Named(a), Event::Named(b)) => a == b,
            (Event::Object(a), Event::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for Event {
    fn from(name: &str) -> Self {
        Event::named(name)
    }
}

impl From<String> for Event {
    fn from(name: String) -> Self {
        Event::Named(CompactString::from(name))
    }
}

impl From<Arc<dyn EventObject>> for Event {
    fn from(object: Arc<dyn EventObject>) -> Self {
        Event::Object(object)
    }
}

/// Result of a dispatch call.
#[derive(Debug, Clone)]
pub enum Response {
    /// Non-halting dispatch completed; carries the dispatched event back
    Event(Event),
    /// Halting dispatch stopped at this listener response
    Value(Value),
    /// Halting dispatch found no listener returning a value
    Null,
    /// The event was buffered by a deferral context or handed to the
    /// transaction manager; no listener has run yet
    Deferred,
}

impl Response {
    /// Name of the event carried by [`Response::Event`]
    pub fn event_name(&self) -> Option<&str> {
        match self {
            Response::Event(event) => Some(event.name()),
            _ => None,
        }
    }

    pub fn event(&self) -> Option<&Event> {
        match self {
            Response::Event(event) => Some(event),
            _ => None,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Response::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Response::Null)
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Response::Deferred)
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Response::Event(event) => write!(f, "{}", event.name()),
            Response::Value(value) => write!(f, "{value}"),
            Response::Null => write!(f, "null"),
            Response::Deferred => write!(f, "deferred"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct OrderShipped;

    impl EventObject for OrderShipped {
        fn class_name(&self) -> &'static str {
            "OrderShipped"
        }

        fn interfaces(&self) -> &'static [&'static str] {
            &["ShouldBroadcast", "OrderEvent"]
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn object_tags_start_with_class_name() {
        let event = Event::object(OrderShipped);
        assert_eq!(event.name(), "OrderShipped");
        assert_eq!(
            event.interface_tags().as_slice(),
            &["OrderShipped", "ShouldBroadcast", "OrderEvent"]
        );
        assert!(event.downcast_ref::<OrderShipped>().is_some());
        assert!(!event.should_dispatch_after_commit());
    }

    #[test]
    fn named_events_compare_by_name() {
        let a = Event::from("user.login");
        let b = Event::from("user.login".to_string());
        assert!(a.same_as(&b));
        assert!(a.interface_tags().is_empty());
        assert!(a.downcast_ref::<OrderShipped>().is_none());
    }

    #[test]
    fn object_events_compare_by_identity() {
        let first = Event::object(OrderShipped);
        let copy = first.clone();
        let other = Event::object(OrderShipped);
        assert!(first.same_as(&copy));
        assert!(!first.same_as(&other));
    }
}
