//! # Event Dispatcher
//!
//! An in-process, async event dispatcher for named and typed events.
//!
//! ## Core Features
//!
//! - **Named and typed events**: dispatch plain names (`"user.login"`) or typed
//!   event objects whose class and interface names are all lookup keys
//! - **Wildcard listeners**: `user.*`, `*.created` and the global `*`, with a
//!   per-name match cache cleared whenever listeners change
//! - **Halting dispatch**: `until` returns the first non-null listener response,
//!   and a listener returning `false` stops propagation
//! - **Deferred dispatch**: `defer` buffers events raised inside a block and
//!   replays them in order once the block succeeds
//! - **Push queue**: `push` stores events until an explicit `flush`
//! - **Lazy class listeners**: `"Class"` and `"Class@method"` listeners are
//!   built through a [`Container`] on every dispatch that reaches them
//! - **After-commit events**: handed to a [`TransactionManager`] instead of
//!   running immediately
//!
//! ## Quick Start Example
//!
//! ```rust
//! use event_dispatcher::{impl_event, payload, DispatchError, Event, EventDispatcher};
//!
//! #[derive(Debug)]
//! struct OrderShipped {
//!     id: u64,
//! }
//! impl_event!(OrderShipped, interfaces = ["ShouldNotify"]);
//!
//! #[tokio::main]
//! async fn main() -> Result<(), DispatchError> {
//!     let events = EventDispatcher::new();
//!
//!     events.listen_fn("user.*", |event, payload| {
//!         println!("{} -> {:?}", event.name(), payload);
//!     });
//!     events.listen_class::<OrderShipped, _, _>(|order, _payload| {
//!         println!("order {} shipped", order.id);
//!     });
//!     events.listen_fn("ShouldNotify", |_event, _payload| false);
//!
//!     events.dispatch("user.login", payload!["taylor"]).await?;
//!
//!     events
//!         .defer(|| async {
//!             events.dispatch(Event::object(OrderShipped { id: 7 }), payload![]).await?;
//!             Ok::<_, DispatchError>(())
//!         })
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#[macro_use]
pub mod macros;

pub mod config;
pub mod container;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod listener;
pub mod registry;
pub mod transaction;
pub mod wildcard;

// Re-export commonly used items for convenience
pub use config::DispatcherConfig;
pub use container::{Container, LazyListenerResolver, ListenerTarget, ServiceContainer};
pub use dispatcher::{DispatcherStats, EventDispatcher};
pub use error::DispatchError;
pub use event::{Event, EventClass, EventObject, EventTags, Payload, Response};
pub use listener::{
    AsyncFnListener, ClassListener, FnListener, IntoListenerResult, Listener, ListenerEntry,
    ListenerSpec,
};
pub use registry::ListenerRegistry;
pub use transaction::{AfterCommitCallback, BufferedTransactionManager, TransactionManager};

// Used by the exported macros
pub use serde_json;

pub use futures::future::BoxFuture;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Version of the event dispatcher crate
pub const DISPATCHER_VERSION: &str = env!("CARGO_PKG_VERSION");
