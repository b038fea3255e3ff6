use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Configuration for an in-memory counter store.
///
/// Cheap to clone; clones share the same settings.
///
/// ```text
/// let config = InMemoryStoreConfig::new();
/// config.set_initial_capacity(128);
/// let store = InMemoryCounterStore::new(config);
/// ```
#[derive(Default, Clone)]
pub struct InMemoryStoreConfig {
    inner: Arc<InMemoryStoreConfigInner>,
}

impl InMemoryStoreConfig {
    pub fn new() -> InMemoryStoreConfig {
        InMemoryStoreConfig {
            inner: Arc::new(InMemoryStoreConfigInner::new()),
        }
    }

    /// Number of counters the store reserves room for up front.
    pub fn initial_capacity(&self) -> usize {
        self.inner.initial_capacity.load(Ordering::Relaxed)
    }

    pub(crate) fn set_initial_capacity(&self, capacity: usize) {
        self.inner
            .initial_capacity
            .store(capacity, Ordering::Relaxed)
    }
}

#[derive(Default)]
struct InMemoryStoreConfigInner {
    initial_capacity: AtomicUsize,
}

impl InMemoryStoreConfigInner {
    fn new() -> InMemoryStoreConfigInner {
        InMemoryStoreConfigInner {
            initial_capacity: AtomicUsize::new(0),
        }
    }
}
