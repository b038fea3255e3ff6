use crate::errors::TallyResult;
use crate::store::memory::{InMemoryCounterStore, InMemoryStoreConfig};
use crate::store::{AtomicCounterStore, StoreModule};

/// Store module producing [InMemoryCounterStore] backends.
///
/// This is the module a [`crate::tally_builder::TallyBuilder`] falls back to when no other
/// store module is loaded.
#[derive(Default)]
pub struct InMemoryStoreModule {
    store_config: InMemoryStoreConfig,
}

impl InMemoryStoreModule {
    pub fn new() -> InMemoryStoreModule {
        InMemoryStoreModule {
            store_config: InMemoryStoreConfig::new(),
        }
    }

    pub fn with_config() -> InMemoryStoreModuleBuilder {
        InMemoryStoreModuleBuilder::new()
    }
}

impl StoreModule for InMemoryStoreModule {
    fn get_store(&self) -> TallyResult<AtomicCounterStore> {
        let store = InMemoryCounterStore::new(self.store_config.clone());
        Ok(AtomicCounterStore::new(store))
    }
}

#[derive(Default)]
pub struct InMemoryStoreModuleBuilder {
    initial_capacity: usize,
}

impl InMemoryStoreModuleBuilder {
    pub fn new() -> InMemoryStoreModuleBuilder {
        InMemoryStoreModuleBuilder {
            initial_capacity: 0,
        }
    }

    /// Reserves room for `capacity` counters when the store is created.
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    pub fn build(self) -> InMemoryStoreModule {
        let store_module = InMemoryStoreModule::new();
        store_module
            .store_config
            .set_initial_capacity(self.initial_capacity);
        store_module
    }
}
