use crate::common::{atomic, Atomic, ReadExecutor, WriteExecutor, DEFAULT_ID_FIELD};
use crate::counter::validate_name;
use crate::errors::{ErrorKind, TallyError, TallyResult};
use crate::sequence::BootstrapPolicy;
use crate::store::memory::InMemoryStoreModule;
use crate::store::{AtomicCounterStore, StoreModule};
use std::sync::Arc;

/// Configuration shared by a [`crate::tally::Tally`] handle and its allocators.
///
/// Holds the bootstrap policy, the document field `assign_id` writes to, the sequence
/// names to provision when the store opens, and the store module the backend is created
/// from. Clones share the same settings.
#[derive(Clone, Default)]
pub struct TallyConfig {
    inner: Arc<TallyConfigInner>,
}

impl TallyConfig {
    pub fn new() -> Self {
        TallyConfig {
            inner: Arc::new(TallyConfigInner::new()),
        }
    }

    pub fn bootstrap_policy(&self) -> BootstrapPolicy {
        self.inner.bootstrap_policy.read_with(|policy| *policy)
    }

    pub(crate) fn set_bootstrap_policy(&self, policy: BootstrapPolicy) {
        self.inner.bootstrap_policy.write_with(|it| *it = policy)
    }

    /// Document field written by `SequenceAllocator::assign_id`. Defaults to `id`.
    pub fn id_field(&self) -> String {
        self.inner.id_field.read_with(|field| field.clone())
    }

    pub(crate) fn set_id_field(&self, field: &str) -> TallyResult<()> {
        if field.trim().is_empty() {
            log::error!("Id field name cannot be empty");
            return Err(TallyError::new(
                "Id field name cannot be empty",
                ErrorKind::InvalidOperation,
            ));
        }
        self.inner.id_field.write_with(|it| *it = field.to_string());
        Ok(())
    }

    /// Sequence names provisioned at `seq = 0` when the store is opened.
    pub fn provisioned_names(&self) -> Vec<String> {
        self.inner.provisioned_names.read_with(|names| names.clone())
    }

    pub(crate) fn add_provisioned_name(&self, name: &str) -> TallyResult<()> {
        validate_name(name)?;
        self.inner.provisioned_names.write_with(|names| {
            if !names.iter().any(|it| it == name) {
                names.push(name.to_string());
            }
        });
        Ok(())
    }

    pub(crate) fn load_module<T: StoreModule + 'static>(&self, module: T) -> TallyResult<()> {
        self.inner.store_module.write_with(|it| {
            if it.is_some() {
                log::error!("A store module is already loaded");
                return Err(TallyError::new(
                    "A store module is already loaded",
                    ErrorKind::InvalidOperation,
                ));
            }
            *it = Some(Box::new(module));
            Ok(())
        })
    }

    pub fn has_store_module(&self) -> bool {
        self.inner.store_module.read_with(|it| it.is_some())
    }

    /// Falls back to the in-memory store if no store module was loaded.
    pub(crate) fn auto_configure(&self) -> TallyResult<()> {
        if !self.has_store_module() {
            log::debug!("No store module loaded, using in-memory store");
            self.load_module(InMemoryStoreModule::new())?;
        }
        Ok(())
    }

    pub(crate) fn create_store(&self) -> TallyResult<AtomicCounterStore> {
        self.inner.store_module.read_with(|it| match it {
            Some(module) => module.get_store(),
            None => Err(TallyError::new(
                "No store module is loaded",
                ErrorKind::StoreNotInitialized,
            )),
        })
    }
}

struct TallyConfigInner {
    bootstrap_policy: Atomic<BootstrapPolicy>,
    id_field: Atomic<String>,
    provisioned_names: Atomic<Vec<String>>,
    store_module: Atomic<Option<Box<dyn StoreModule>>>,
}

impl TallyConfigInner {
    fn new() -> Self {
        TallyConfigInner {
            bootstrap_policy: atomic(BootstrapPolicy::default()),
            id_field: atomic(DEFAULT_ID_FIELD.to_string()),
            provisioned_names: atomic(Vec::new()),
            store_module: atomic(None),
        }
    }
}

impl Default for TallyConfigInner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = TallyConfig::new();
        assert_eq!(config.bootstrap_policy(), BootstrapPolicy::Strict);
        assert_eq!(config.id_field(), "id");
        assert!(config.provisioned_names().is_empty());
        assert!(!config.has_store_module());
    }

    #[test]
    fn set_id_field_rejects_blank() {
        let config = TallyConfig::new();
        assert!(config.set_id_field("city_id").is_ok());
        assert_eq!(config.id_field(), "city_id");
        let err = config.set_id_field(" ").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
        assert_eq!(config.id_field(), "city_id");
    }

    #[test]
    fn provisioned_names_are_deduplicated() {
        let config = TallyConfig::new();
        config.add_provisioned_name("cities").unwrap();
        config.add_provisioned_name("orders").unwrap();
        config.add_provisioned_name("cities").unwrap();
        assert_eq!(config.provisioned_names(), vec!["cities", "orders"]);
    }

    #[test]
    fn provisioned_name_must_be_valid() {
        let config = TallyConfig::new();
        let err = config.add_provisioned_name("").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidName);
    }

    #[test]
    fn second_store_module_is_rejected() {
        let config = TallyConfig::new();
        config.load_module(InMemoryStoreModule::new()).unwrap();
        let err = config.load_module(InMemoryStoreModule::new()).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
    }

    #[test]
    fn auto_configure_loads_in_memory_store() {
        let config = TallyConfig::new();
        assert!(config.create_store().is_err());
        config.auto_configure().unwrap();
        assert!(config.has_store_module());
        let store = config.create_store().unwrap();
        assert!(store.store_version().unwrap().starts_with("InMemory/"));
    }

    #[test]
    fn clones_share_settings() {
        let config = TallyConfig::new();
        let clone = config.clone();
        clone.set_bootstrap_policy(BootstrapPolicy::UpsertOnFirstUse);
        assert_eq!(config.bootstrap_policy(), BootstrapPolicy::UpsertOnFirstUse);
    }
}
