use crate::counter::Counter;
use crate::errors::TallyResult;
use std::ops::Deref;
use std::sync::Arc;

/// Contract every counter store backend must fulfil.
///
/// # Purpose
/// A store keeps one counter record per sequence name and exposes the single atomic
/// primitive the allocator is built on: [AtomicCounterStoreProvider::increment_and_fetch],
/// which finds the record for a name, adds one to its `seq` field and returns the
/// resulting record as one indivisible step.
///
/// # Atomicity
/// Implementations must guarantee that two concurrent `increment_and_fetch` calls on the
/// same name never observe the same pre-increment value, and that a failed call leaves the
/// stored `seq` unchanged. Calls on different names must not serialize behind each other
/// beyond what the backend's own partitioning imposes.
///
/// # Implementations
/// - `InMemoryCounterStore`: DashMap-backed, for tests and single-process use
/// - `FjallCounterStore`: persistent, backed by a fjall transactional keyspace
///
/// # Thread Safety
/// Implementers must be `Send + Sync`.
pub trait AtomicCounterStoreProvider: Send + Sync {
    /// Opens or creates the store. Must be called before any counter operation.
    fn open_or_create(&self) -> TallyResult<()>;

    /// Checks if the store is closed.
    fn is_closed(&self) -> TallyResult<bool>;

    /// Flushes pending writes to durable storage. A no-op for in-memory stores.
    fn commit(&self) -> TallyResult<()>;

    /// Closes the store. Any further counter operation fails with `StoreAlreadyClosed`.
    fn close(&self) -> TallyResult<()>;

    /// Creates the counter `{ name, seq: 0 }` if it does not exist yet.
    ///
    /// # Returns
    /// * `Ok(true)` if the counter was created
    /// * `Ok(false)` if it already existed; its value is left untouched
    fn provision(&self, name: &str) -> TallyResult<bool>;

    /// Atomically increments the counter for `name` by one and returns the updated record.
    ///
    /// # Arguments
    /// * `name` - The sequence name
    /// * `upsert` - When `true`, a missing counter is created at `seq = 0` and incremented
    ///   within the same atomic step
    ///
    /// # Returns
    /// * `Ok(Some(counter))` with the post-increment record
    /// * `Ok(None)` if no counter matches and `upsert` is `false`
    /// * `Err(TallyError)` if the primitive could not complete; the record is unchanged
    fn increment_and_fetch(&self, name: &str, upsert: bool) -> TallyResult<Option<Counter>>;

    /// Reads the counter for `name` without modifying it.
    fn find(&self, name: &str) -> TallyResult<Option<Counter>>;

    /// Deletes the counter for `name`. Returns whether a record was removed.
    fn remove(&self, name: &str) -> TallyResult<bool>;

    /// Names of all stored counters in ascending order.
    fn counter_names(&self) -> TallyResult<Vec<String>>;

    /// Backend name and version, e.g. `InMemory/0.1.0`.
    fn store_version(&self) -> TallyResult<String>;
}

/// Cloneable handle to a counter store backend.
///
/// `AtomicCounterStore` wraps any [AtomicCounterStoreProvider] in an `Arc` so the same
/// backend can be shared by every allocator clone and thread. It dereferences to the
/// provider trait, so all store operations are called directly on the handle.
///
/// ```text
/// let store = AtomicCounterStore::new(InMemoryCounterStore::new(InMemoryStoreConfig::new()));
/// store.open_or_create()?;
/// store.provision("cities")?;
/// let counter = store.increment_and_fetch("cities", false)?;
/// ```
#[derive(Clone)]
pub struct AtomicCounterStore {
    inner: Arc<dyn AtomicCounterStoreProvider>,
}

impl AtomicCounterStore {
    pub fn new<T: AtomicCounterStoreProvider + 'static>(inner: T) -> Self {
        AtomicCounterStore {
            inner: Arc::new(inner),
        }
    }
}

impl Deref for AtomicCounterStore {
    type Target = Arc<dyn AtomicCounterStoreProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
