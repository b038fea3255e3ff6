use crate::common::{Document, TALLY_VERSION};
use crate::counter::Counter;
use crate::errors::{ErrorKind, TallyError, TallyResult};
use crate::store::memory::InMemoryStoreConfig;
use crate::store::AtomicCounterStoreProvider;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// In-memory counter store.
///
/// # Purpose
/// Keeps counter documents in a `DashMap` keyed by sequence name. Suitable for tests and
/// for sequences that only need to be unique within one process lifetime.
///
/// # Atomicity
/// `increment_and_fetch` runs inside a DashMap entry guard, which holds the write lock of
/// the shard owning the name for the whole read-modify-write. Names in other shards are
/// not blocked.
///
/// # Usage
/// ```text
/// let store = InMemoryCounterStore::new(InMemoryStoreConfig::new());
/// store.open_or_create()?;
/// store.provision("cities")?;
/// let counter = store.increment_and_fetch("cities", false)?;
/// ```
#[derive(Clone)]
pub struct InMemoryCounterStore {
    inner: Arc<InMemoryCounterStoreInner>,
}

impl InMemoryCounterStore {
    pub fn new(store_config: InMemoryStoreConfig) -> InMemoryCounterStore {
        InMemoryCounterStore {
            inner: Arc::new(InMemoryCounterStoreInner::new(store_config)),
        }
    }
}

impl AtomicCounterStoreProvider for InMemoryCounterStore {
    fn open_or_create(&self) -> TallyResult<()> {
        self.inner.open_or_create()
    }

    fn is_closed(&self) -> TallyResult<bool> {
        Ok(self.inner.closed.load(Ordering::Acquire))
    }

    fn commit(&self) -> TallyResult<()> {
        self.inner.check_opened()
    }

    fn close(&self) -> TallyResult<()> {
        self.inner.close()
    }

    fn provision(&self, name: &str) -> TallyResult<bool> {
        self.inner.provision(name)
    }

    fn increment_and_fetch(&self, name: &str, upsert: bool) -> TallyResult<Option<Counter>> {
        self.inner.increment_and_fetch(name, upsert)
    }

    fn find(&self, name: &str) -> TallyResult<Option<Counter>> {
        self.inner.find(name)
    }

    fn remove(&self, name: &str) -> TallyResult<bool> {
        self.inner.remove(name)
    }

    fn counter_names(&self) -> TallyResult<Vec<String>> {
        self.inner.counter_names()
    }

    fn store_version(&self) -> TallyResult<String> {
        Ok(format!("InMemory/{}", TALLY_VERSION))
    }
}

struct InMemoryCounterStoreInner {
    opened: AtomicBool,
    closed: AtomicBool,
    counters: DashMap<String, Document>,
}

impl InMemoryCounterStoreInner {
    fn new(store_config: InMemoryStoreConfig) -> InMemoryCounterStoreInner {
        InMemoryCounterStoreInner {
            opened: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            counters: DashMap::with_capacity(store_config.initial_capacity()),
        }
    }

    fn open_or_create(&self) -> TallyResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TallyError::new(
                "In-memory store cannot be reopened after close",
                ErrorKind::StoreAlreadyClosed,
            ));
        }
        self.opened.store(true, Ordering::Release);
        Ok(())
    }

    fn close(&self) -> TallyResult<()> {
        self.closed.store(true, Ordering::Release);
        self.counters.clear();
        Ok(())
    }

    fn check_opened(&self) -> TallyResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TallyError::new(
                "Store is already closed",
                ErrorKind::StoreAlreadyClosed,
            ));
        }
        if !self.opened.load(Ordering::Acquire) {
            return Err(TallyError::new(
                "Store is not opened yet",
                ErrorKind::StoreNotInitialized,
            ));
        }
        Ok(())
    }

    fn provision(&self, name: &str) -> TallyResult<bool> {
        self.check_opened()?;
        match self.counters.entry(name.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(entry) => {
                entry.insert(Counter::new(name).to_document());
                Ok(true)
            }
        }
    }

    fn increment_and_fetch(&self, name: &str, upsert: bool) -> TallyResult<Option<Counter>> {
        self.check_opened()?;
        // the entry guard keeps the shard locked until the updated document is written back
        match self.counters.entry(name.to_string()) {
            Entry::Occupied(mut entry) => {
                let next = Counter::from_document(entry.get())?.incremented()?;
                entry.insert(next.to_document());
                Ok(Some(next))
            }
            Entry::Vacant(entry) => {
                if !upsert {
                    return Ok(None);
                }
                let next = Counter::new(name).incremented()?;
                entry.insert(next.to_document());
                Ok(Some(next))
            }
        }
    }

    fn find(&self, name: &str) -> TallyResult<Option<Counter>> {
        self.check_opened()?;
        match self.counters.get(name) {
            Some(document) => Ok(Some(Counter::from_document(document.value())?)),
            None => Ok(None),
        }
    }

    fn remove(&self, name: &str) -> TallyResult<bool> {
        self.check_opened()?;
        Ok(self.counters.remove(name).is_some())
    }

    fn counter_names(&self) -> TallyResult<Vec<String>> {
        self.check_opened()?;
        let mut names: Vec<String> = self
            .counters
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        Ok(names)
    }
}
