/// Core EventDispatcher implementation
use super::defer::{self, DeferralFrame};
use super::stats::{DispatcherStats, StatsCounters};
use crate::config::DispatcherConfig;
use crate::container::Container;
use crate::event::{Event, Payload};
use crate::listener::ListenerEntry;
use crate::registry::ListenerRegistry;
use crate::transaction::{TransactionManager, TransactionManagerResolver};
use compact_str::CompactString;
use dashmap::DashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

/// State shared by every handle of one dispatcher: listeners, collaborators
/// and statistics.
pub(super) struct Shared {
    pub(super) registry: Mutex<ListenerRegistry>,
    pub(super) container: RwLock<Option<Arc<dyn Container>>>,
    pub(super) transactions: RwLock<Option<TransactionManagerResolver>>,
    pub(super) stats: StatsCounters,
    pub(super) config: DispatcherConfig,
}

/// State owned by one logical execution context (a request, a task).
#[derive(Default)]
pub(super) struct Scope {
    pub(super) frames: Mutex<Vec<DeferralFrame>>,
    pub(super) pushed: DashMap<CompactString, Vec<(Event, Payload)>>,
}

/// The event dispatcher.
///
/// Cloning is cheap and yields a handle onto the same listeners *and* the
/// same deferral/push state. Use [`EventDispatcher::scoped`] to get a handle
/// that shares listeners but has its own deferral stack and push queue, one
/// per concurrently running task.
///
/// Listeners run one after another, never concurrently, and no internal lock
/// is held while a listener runs, so listeners may freely register listeners,
/// dispatch, defer or push through a captured handle.
#[derive(Clone)]
pub struct EventDispatcher {
    pub(super) shared: Arc<Shared>,
    pub(super) scope: Arc<Scope>,
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listeners", &self.shared.lock_registry().len())
            .field("defer_depth", &self.defer_depth())
            .field("pushed_keys", &self.scope.pushed.len())
            .field("container", &self.container().is_some())
            .field("transactions", &self.has_transaction_manager_resolver())
            .field("config", &self.shared.config)
            .finish()
    }
}

impl EventDispatcher {
    /// Creates a dispatcher with no listeners and the default configuration.
    pub fn new() -> Self {
        Self::with_config(DispatcherConfig::default())
    }

    /// Creates a dispatcher with the given configuration
    pub fn with_config(config: DispatcherConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                registry: Mutex::new(ListenerRegistry::with_wildcard_cache(config.wildcard_cache)),
                container: RwLock::new(None),
                transactions: RwLock::new(None),
                stats: StatsCounters::default(),
                config,
            }),
            scope: Arc::new(Scope::default()),
        }
    }

    /// Creates a dispatcher that resolves class listeners through `container`
    pub fn with_container(container: Arc<dyn Container>) -> Self {
        let dispatcher = Self::new();
        dispatcher.set_container(container);
        dispatcher
    }

    /// A handle sharing listeners and collaborators, with fresh deferral
    /// and push state.
    pub fn scoped(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            scope: Arc::new(Scope::default()),
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.shared.config
    }

    /// Sets the container used to resolve class-based listeners
    pub fn set_container(&self, container: Arc<dyn Container>) {
        *self
            .shared
            .container
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(container);
    }

    #[inline]
    pub fn container(&self) -> Option<Arc<dyn Container>> {
        self.shared.container()
    }

    /// Sets the resolver consulted for events that dispatch after commit
    pub fn set_transaction_manager_resolver<F>(&self, resolver: F)
    where
        F: Fn() -> Option<Arc<dyn TransactionManager>> + Send + Sync + 'static,
    {
        *self
            .shared
            .transactions
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(resolver));
    }

    fn has_transaction_manager_resolver(&self) -> bool {
        self.shared
            .transactions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// The transaction manager for the current context, if a resolver is set
    /// and it yields one
    pub fn transaction_manager(&self) -> Option<Arc<dyn TransactionManager>> {
        let resolver = self
            .shared
            .transactions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()?;
        resolver()
    }

    /// Gets the current dispatcher statistics
    pub fn stats(&self) -> DispatcherStats {
        let total = self.shared.lock_registry().len();
        self.shared.stats.snapshot(total)
    }

    /// Number of deferral contexts open in this scope
    pub fn defer_depth(&self) -> usize {
        defer::open_contexts(&self.scope.lock_frames())
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Shared {
    #[inline]
    pub(super) fn lock_registry(&self) -> MutexGuard<'_, ListenerRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn container(&self) -> Option<Arc<dyn Container>> {
        self.container
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot the listeners that fire for `event`, in firing order
    pub(super) fn listeners_for(&self, event: &Event) -> Vec<ListenerEntry> {
        let tags = event.interface_tags();
        self.lock_registry()
            .listeners_for_tags(event.name(), tags.as_slice())
    }
}

impl Scope {
    #[inline]
    pub(super) fn lock_frames(&self) -> MutexGuard<'_, Vec<DeferralFrame>> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
