//! Macros for declaring events and building payloads

/// Build a listener payload from JSON-convertible expressions.
///
/// ```rust
/// use event_dispatcher::payload;
///
/// let id = 7;
/// let args = payload!["taylor", -id, { "admin": true }];
/// assert_eq!(args.len(), 3);
/// ```
#[macro_export]
macro_rules! payload {
    () => {
        ::std::vec::Vec::<$crate::serde_json::Value>::new()
    };
    ($($value:tt)+) => {
        match $crate::serde_json::json!([$($value)+]) {
            $crate::serde_json::Value::Array(values) => values,
            _ => ::std::vec::Vec::new(),
        }
    };
}

/// Implement [`EventObject`](crate::EventObject) and
/// [`EventClass`](crate::EventClass) for a type, using the type name as the
/// event class.
///
/// ```rust
/// use event_dispatcher::impl_event;
///
/// #[derive(Debug)]
/// struct OrderShipped { id: u64 }
/// impl_event!(OrderShipped, interfaces = ["ShouldBroadcast"]);
///
/// #[derive(Debug)]
/// struct InvoicePaid;
/// impl_event!(InvoicePaid, after_commit);
/// ```
#[macro_export]
macro_rules! impl_event {
    ($name:ident) => {
        $crate::impl_event!($name, interfaces = [], after_commit = false);
    };
    ($name:ident, after_commit) => {
        $crate::impl_event!($name, interfaces = [], after_commit = true);
    };
    ($name:ident, interfaces = [$($iface:expr),* $(,)?]) => {
        $crate::impl_event!($name, interfaces = [$($iface),*], after_commit = false);
    };
    ($name:ident, interfaces = [$($iface:expr),* $(,)?], after_commit) => {
        $crate::impl_event!($name, interfaces = [$($iface),*], after_commit = true);
    };
    ($name:ident, interfaces = [$($iface:expr),* $(,)?], after_commit = $after:expr) => {
        impl $crate::EventObject for $name {
            fn class_name(&self) -> &'static str {
                <Self as $crate::EventClass>::CLASS
            }

            fn interfaces(&self) -> &'static [&'static str] {
                &[$($iface),*]
            }

            fn dispatch_after_commit(&self) -> bool {
                $after
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }

        impl $crate::EventClass for $name {
            const CLASS: &'static str = stringify!($name);
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::{EventClass, EventObject};

    #[derive(Debug)]
    struct PodcastPublished;
    crate::impl_event!(PodcastPublished, interfaces = ["ShouldBroadcast", "Publishable"]);

    #[derive(Debug)]
    struct PaymentCaptured;
    crate::impl_event!(PaymentCaptured, after_commit);

    #[test]
    fn declared_events_report_class_and_interfaces() {
        assert_eq!(PodcastPublished::CLASS, "PodcastPublished");
        assert_eq!(PodcastPublished.class_name(), "PodcastPublished");
        assert_eq!(
            PodcastPublished.interfaces(),
            &["ShouldBroadcast", "Publishable"]
        );
        assert!(!PodcastPublished.dispatch_after_commit());
        assert!(PaymentCaptured.dispatch_after_commit());
    }

    #[test]
    fn payload_converts_values() {
        let empty = payload![];
        assert!(empty.is_empty());

        let args = payload!["bar", 3, { "name": "taylor" }];
        assert_eq!(args[0], "bar");
        assert_eq!(args[1], 3);
        assert_eq!(args[2]["name"], "taylor");
    }

    #[test]
    fn payload_accepts_arbitrary_expressions() {
        struct User {
            id: u64,
            balance: i64,
        }
        let user = User { id: 9, balance: 40 };

        let args = payload![user.id, -1, -user.balance, user.id * 2,];
        assert_eq!(args.len(), 4);
        assert_eq!(args[0], 9);
        assert_eq!(args[1], -1);
        assert_eq!(args[2], -40);
        assert_eq!(args[3], 18);
    }
}
