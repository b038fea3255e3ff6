use crate::errors::TallyResult;
use crate::store::AtomicCounterStore;

/// Factory for a counter store backend.
///
/// A module carries the backend's configuration and produces a fresh, unopened
/// [AtomicCounterStore] when the builder opens a [`crate::tally::Tally`]. Every backend crate
/// ships one (`InMemoryStoreModule`, `FjallModule`).
pub trait StoreModule: Send + Sync {
    fn get_store(&self) -> TallyResult<AtomicCounterStore>;
}
