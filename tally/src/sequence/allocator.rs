use crate::common::Document;
use crate::counter::validate_name;
use crate::errors::{ErrorKind, TallyError, TallyResult};
use crate::store::AtomicCounterStore;
use crate::tally_config::TallyConfig;

/// Hands out strictly increasing, never reused values for named sequences.
///
/// # Purpose
/// `SequenceAllocator` turns the store's atomic increment-and-fetch into unique ids for a
/// sequence name. It keeps no counter state of its own: every call is a single round trip
/// to the [AtomicCounterStore], and all synchronization between callers, threads and
/// processes is the store's job.
///
/// # Characteristics
/// - **Stateless**: clones share the store handle and configuration only
/// - **Thread-safe**: `Clone + Send + Sync`, usable from any number of threads
/// - **Isolated**: allocations on one name never change another name's counter
/// - **No hidden retries**: a store failure surfaces once as
///   [ErrorKind::StorageUnavailable]; retrying is up to the caller
///
/// # Bootstrap
/// What happens on a name without a counter depends on the configured
/// [crate::sequence::BootstrapPolicy]. Under the default `Strict` policy the counter has to
/// be provisioned first:
///
/// ```rust,ignore
/// let tally = Tally::builder().provision("cities").open()?;
/// let sequences = tally.sequences();
/// assert_eq!(sequences.next("cities")?, 1);
/// assert_eq!(sequences.next("cities")?, 2);
/// ```
#[derive(Clone)]
pub struct SequenceAllocator {
    store: AtomicCounterStore,
    config: TallyConfig,
}

impl SequenceAllocator {
    /// Creates an allocator over an opened store.
    pub fn new(store: AtomicCounterStore, config: TallyConfig) -> Self {
        SequenceAllocator { store, config }
    }

    /// Atomically advances the counter for `name` and returns the new value.
    ///
    /// The returned value is exactly one greater than the value stored before the call, and
    /// no other caller, concurrent or later, receives it for the same name.
    ///
    /// # Errors
    /// - [ErrorKind::InvalidName] if `name` is blank
    /// - [ErrorKind::NotFound] if the counter does not exist and the policy is `Strict`
    /// - [ErrorKind::SequenceOverflow] if the counter is at `u64::MAX`
    /// - [ErrorKind::StorageUnavailable] if the store could not run the increment; the
    ///   counter is unchanged and the store error is kept as the cause
    pub fn next(&self, name: &str) -> TallyResult<u64> {
        validate_name(name)?;
        let upsert = self.config.bootstrap_policy().upsert();

        match self.store.increment_and_fetch(name, upsert) {
            Ok(Some(counter)) => {
                log::debug!("Allocated {} for sequence '{}'", counter.seq(), name);
                Ok(counter.seq())
            }
            Ok(None) => {
                log::debug!("Sequence '{}' is not provisioned", name);
                Err(TallyError::not_found(name))
            }
            Err(err) => Err(self.surface(name, err)),
        }
    }

    /// Creates the counter for `name` at `seq = 0` unless it already exists.
    ///
    /// Returns `true` if this call created the counter. An existing counter keeps its value,
    /// so provisioning at every startup is safe.
    pub fn provision(&self, name: &str) -> TallyResult<bool> {
        validate_name(name)?;
        let created = self
            .store
            .provision(name)
            .map_err(|err| self.surface(name, err))?;
        if created {
            log::debug!("Provisioned sequence '{}'", name);
        }
        Ok(created)
    }

    /// Returns the last value issued for `name` without advancing it.
    ///
    /// A provisioned counter that has not issued anything yet reports `0`. Reading never
    /// creates a counter, regardless of the bootstrap policy.
    pub fn current(&self, name: &str) -> TallyResult<u64> {
        validate_name(name)?;
        match self.store.find(name) {
            Ok(Some(counter)) => Ok(counter.seq()),
            Ok(None) => Err(TallyError::not_found(name)),
            Err(err) => Err(self.surface(name, err)),
        }
    }

    /// Deletes the counter for `name`. Returns whether a counter was removed.
    ///
    /// The next allocation on `name` is subject to the bootstrap policy again, and values
    /// issued before the reset may be issued a second time. Only use this when the ids
    /// minted from the sequence are gone as well.
    pub fn reset(&self, name: &str) -> TallyResult<bool> {
        validate_name(name)?;
        let removed = self
            .store
            .remove(name)
            .map_err(|err| self.surface(name, err))?;
        if removed {
            log::debug!("Reset sequence '{}'", name);
        }
        Ok(removed)
    }

    /// Names of all existing counters in ascending order.
    pub fn names(&self) -> TallyResult<Vec<String>> {
        self.store.counter_names().map_err(|err| {
            log::error!("Failed to list sequence names: {}", err);
            TallyError::new_with_cause(
                "Failed to list sequence names",
                ErrorKind::StorageUnavailable,
                err,
            )
        })
    }

    /// Allocates the next value of `name` and writes it into the id field of `document`.
    ///
    /// The id field is taken from the configuration (`id` unless changed on the builder).
    /// Returns the allocated value.
    ///
    /// # Errors
    /// [ErrorKind::InvalidOperation] if the document already has an id field; no value is
    /// consumed in that case. Otherwise the same errors as [SequenceAllocator::next].
    pub fn assign_id(&self, name: &str, document: &mut Document) -> TallyResult<u64> {
        let id_field = self.config.id_field();
        if document.contains_key(&id_field) {
            log::error!("Document already has an '{}' field", id_field);
            return Err(TallyError::new(
                &format!("Document already has an '{}' field", id_field),
                ErrorKind::InvalidOperation,
            ));
        }

        let id = self.next(name)?;
        document.put(id_field, id)?;
        Ok(id)
    }

    pub fn store(&self) -> AtomicCounterStore {
        self.store.clone()
    }

    fn surface(&self, name: &str, err: TallyError) -> TallyError {
        let passthrough = matches!(
            err.kind(),
            ErrorKind::NotFound | ErrorKind::InvalidName | ErrorKind::SequenceOverflow
        );
        if passthrough {
            return err;
        }
        log::error!("Store failed for sequence '{}': {}", name, err);
        TallyError::storage_unavailable(name, err)
    }
}
