use crate::errors::TallyResult;
use crate::sequence::SequenceAllocator;
use crate::store::AtomicCounterStore;
use crate::tally_builder::TallyBuilder;
use crate::tally_config::TallyConfig;
use std::sync::Arc;

/// An open counter store together with its configuration.
///
/// `Tally` is the handle applications keep around: it owns the opened
/// [AtomicCounterStore] and hands out [SequenceAllocator]s over it. Clones share the same
/// store. When the last clone is dropped, pending writes are committed and the store is
/// closed.
///
/// # Examples
///
/// ```rust,ignore
/// use tally::tally::Tally;
/// use tally::doc;
///
/// let tally = Tally::builder().provision("cities").open()?;
/// let sequences = tally.sequences();
///
/// let mut city = doc! { name: "Oslo" };
/// sequences.assign_id("cities", &mut city)?;
/// assert_eq!(city.get("id").as_u64(), Some(1));
///
/// tally.close()?;
/// ```
#[derive(Clone)]
pub struct Tally {
    inner: Arc<TallyInner>,
}

impl Tally {
    pub fn builder() -> TallyBuilder {
        TallyBuilder::new()
    }

    pub(crate) fn open(tally_config: TallyConfig) -> TallyResult<Tally> {
        let store = tally_config.create_store()?;
        store.open_or_create()?;
        let tally = Tally {
            inner: Arc::new(TallyInner {
                tally_config,
                store,
            }),
        };
        tally.inner.provision_configured()?;
        Ok(tally)
    }

    /// Allocator over this instance's store.
    pub fn sequences(&self) -> SequenceAllocator {
        SequenceAllocator::new(self.inner.store.clone(), self.inner.tally_config.clone())
    }

    pub fn config(&self) -> TallyConfig {
        self.inner.tally_config.clone()
    }

    pub fn store(&self) -> AtomicCounterStore {
        self.inner.store.clone()
    }

    /// Flushes counter updates to durable storage.
    pub fn commit(&self) -> TallyResult<()> {
        self.inner.store.commit()
    }

    /// Commits and closes the store. Allocations afterwards fail.
    pub fn close(&self) -> TallyResult<()> {
        self.inner.close()
    }

    pub fn is_closed(&self) -> TallyResult<bool> {
        self.inner.store.is_closed()
    }
}

struct TallyInner {
    tally_config: TallyConfig,
    store: AtomicCounterStore,
}

impl TallyInner {
    fn provision_configured(&self) -> TallyResult<()> {
        let sequences = SequenceAllocator::new(self.store.clone(), self.tally_config.clone());
        for name in self.tally_config.provisioned_names() {
            sequences.provision(&name)?;
        }
        Ok(())
    }

    fn close(&self) -> TallyResult<()> {
        if self.store.is_closed()? {
            return Ok(());
        }
        self.store.commit()?;
        self.store.close()
    }
}

impl Drop for TallyInner {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            log::error!("Failed to close counter store: {}", err);
        }
    }
}
