use crate::config::FjallConfig;
use crate::version::fjall_version;
use crate::wrapper::{decode_name, to_tally_error, FjallValue};
use fjall::{PersistMode, TxKeyspace, TxPartitionHandle, UserValue};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tally::common::COUNTERS_COLLECTION;
use tally::counter::Counter;
use tally::errors::{ErrorKind, TallyError, TallyResult};
use tally::store::AtomicCounterStoreProvider;

/// Fjall-backed counter store.
///
/// Keeps one record per sequence name in the `counters` partition of a transactional
/// keyspace. Keys are the UTF-8 bytes of the name, values the bincode-encoded counter
/// document `{ name, seq }`.
///
/// Atomicity: every read-modify-write goes through `TxPartitionHandle::update_fetch`,
/// which runs inside a single write transaction. The keyspace is opened in fjall's
/// single-writer mode, so write transactions on the keyspace are serialized and two
/// increments can never observe the same stored value. When the update closure fails
/// (corrupt record, overflow) it writes the current record back, leaving `seq` unchanged.
///
/// Durability: counter updates reach the journal immediately; `commit` syncs it to disk,
/// and unless `manual_journal_persist` is set fjall persists it on its own as well.
#[derive(Clone)]
pub struct FjallCounterStore {
    inner: Arc<FjallCounterStoreInner>,
}

impl FjallCounterStore {
    #[inline]
    pub fn new(config: FjallConfig) -> FjallCounterStore {
        FjallCounterStore {
            inner: Arc::new(FjallCounterStoreInner::new(config)),
        }
    }
}

impl AtomicCounterStoreProvider for FjallCounterStore {
    fn open_or_create(&self) -> TallyResult<()> {
        self.inner.open_or_create()
    }

    fn is_closed(&self) -> TallyResult<bool> {
        Ok(self.inner.closed.load(Ordering::Acquire))
    }

    fn commit(&self) -> TallyResult<()> {
        self.inner.commit()
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
        match fjall_version() {
            Ok(version) => Ok(format!("Fjall/{}", version)),
            Err(e) => Err(TallyError::new(
                &format!("Failed to determine Fjall version: {}", e),
                ErrorKind::InternalError,
            )),
        }
    }
}

struct FjallHandles {
    keyspace: TxKeyspace,
    counters: TxPartitionHandle,
}

struct FjallCounterStoreInner {
    store_config: FjallConfig,
    handles: RwLock<Option<FjallHandles>>,
    closed: AtomicBool,
}

impl FjallCounterStoreInner {
    fn new(config: FjallConfig) -> FjallCounterStoreInner {
        FjallCounterStoreInner {
            store_config: config,
            handles: RwLock::new(None),
            closed: AtomicBool::new(false),
        }
    }

    fn open_or_create(&self) -> TallyResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TallyError::new(
                "Fjall store cannot be reopened after close",
                ErrorKind::StoreAlreadyClosed,
            ));
        }

        let mut handles = self.handles.write();
        if handles.is_some() {
            return Ok(());
        }

        if self.store_config.db_path().is_empty() {
            log::error!("Fjall db path is not set");
            return Err(TallyError::new(
                "Fjall db path is not set",
                ErrorKind::InvalidOperation,
            ));
        }

        let keyspace = self
            .store_config
            .keyspace_config()
            .open_transactional()
            .map_err(|err| {
                log::error!("Failed to open or create keyspace: {}", err);
                to_tally_error(err)
            })?;

        let counters = keyspace
            .open_partition(COUNTERS_COLLECTION, self.store_config.partition_config())
            .map_err(|err| {
                log::error!("Failed to open counters partition: {}", err);
                to_tally_error(err)
            })?;

        log::debug!("Opened counter store at {}", self.store_config.db_path());
        *handles = Some(FjallHandles { keyspace, counters });
        Ok(())
    }

    fn with_handles<R>(&self, f: impl FnOnce(&FjallHandles) -> TallyResult<R>) -> TallyResult<R> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TallyError::new(
                "Store is already closed",
                ErrorKind::StoreAlreadyClosed,
            ));
        }

        let handles = self.handles.read();
        match handles.as_ref() {
            Some(handles) => f(handles),
            None => Err(TallyError::new(
                "Store is not opened yet",
                ErrorKind::StoreNotInitialized,
            )),
        }
    }

    fn commit(&self) -> TallyResult<()> {
        self.with_handles(Self::persist)
    }

    fn persist(handles: &FjallHandles) -> TallyResult<()> {
        handles
            .keyspace
            .persist(PersistMode::SyncAll)
            .map_err(|err| {
                log::error!("Failed to commit keyspace: {}", err);
                to_tally_error(err)
            })
    }

    fn close(&self) -> TallyResult<()> {
        let mut handles = self.handles.write();
        if let Some(opened) = handles.as_ref() {
            if self.store_config.commit_before_close() {
                Self::persist(opened)?;
            }
        }
        // dropping the handles releases the keyspace
        *handles = None;
        self.closed.store(true, Ordering::Release);
        Ok(())
    }

    fn provision(&self, name: &str) -> TallyResult<bool> {
        self.with_handles(|handles| {
            let mut existed = false;
            let mut failure = None;

            handles
                .counters
                .update_fetch(name.as_bytes(), |current| {
                    existed = current.is_some();
                    failure = None;
                    if current.is_some() {
                        return current.cloned();
                    }
                    match encode(&Counter::new(name)) {
                        Ok(value) => Some(value),
                        Err(err) => {
                            failure = Some(err);
                            None
                        }
                    }
                })
                .map_err(|err| {
                    log::error!("Failed to provision counter '{}': {}", name, err);
                    to_tally_error(err)
                })?;

            match failure {
                Some(err) => Err(err),
                None => Ok(!existed),
            }
        })
    }

    fn increment_and_fetch(&self, name: &str, upsert: bool) -> TallyResult<Option<Counter>> {
        self.with_handles(|handles| {
            let mut issued = None;
            let mut failure = None;

            handles
                .counters
                .update_fetch(name.as_bytes(), |current| {
                    issued = None;
                    failure = None;
                    match next_record(name, current, upsert) {
                        Ok(Some((counter, value))) => {
                            issued = Some(counter);
                            Some(value)
                        }
                        Ok(None) => None,
                        Err(err) => {
                            // keep the stored record as it is
                            failure = Some(err);
                            current.cloned()
                        }
                    }
                })
                .map_err(|err| {
                    log::error!("Failed to increment counter '{}': {}", name, err);
                    to_tally_error(err)
                })?;

            match failure {
                Some(err) => Err(err),
                None => Ok(issued),
            }
        })
    }

    fn find(&self, name: &str) -> TallyResult<Option<Counter>> {
        self.with_handles(|handles| {
            let value = handles.counters.get(name.as_bytes()).map_err(|err| {
                log::error!("Failed to read counter '{}': {}", name, err);
                to_tally_error(err)
            })?;

            match value {
                Some(bytes) => Ok(Some(decode(&bytes)?)),
                None => Ok(None),
            }
        })
    }

    fn remove(&self, name: &str) -> TallyResult<bool> {
        self.with_handles(|handles| {
            let mut existed = false;
            handles
                .counters
                .update_fetch(name.as_bytes(), |current| {
                    existed = current.is_some();
                    None
                })
                .map_err(|err| {
                    log::error!("Failed to remove counter '{}': {}", name, err);
                    to_tally_error(err)
                })?;
            Ok(existed)
        })
    }

    fn counter_names(&self) -> TallyResult<Vec<String>> {
        self.with_handles(|handles| {
            // keys iterate in byte order, which for UTF-8 names is string order
            let snapshot = handles.keyspace.read_tx();
            let mut names = Vec::new();
            for key in snapshot.keys(&handles.counters) {
                let key = key.map_err(|err| {
                    log::error!("Failed to list counters: {}", err);
                    to_tally_error(err)
                })?;
                names.push(decode_name(&key)?);
            }
            Ok(names)
        })
    }
}

impl Drop for FjallCounterStoreInner {
    fn drop(&mut self) {
        if !self.store_config.commit_before_close() {
            return;
        }
        if let Some(handles) = self.handles.get_mut().as_ref() {
            match Self::persist(handles) {
                Ok(_) => log::debug!("Committed counter store during drop"),
                Err(e) => log::error!("Failed to commit counter store during drop: {}", e),
            }
        }
    }
}

fn encode(counter: &Counter) -> TallyResult<UserValue> {
    let value = FjallValue::try_from_document(&counter.to_document())?;
    Ok(value.into())
}

fn decode(bytes: &UserValue) -> TallyResult<Counter> {
    let document = FjallValue::from(bytes).try_into_document()?;
    Counter::from_document(&document)
}

/// Computes the record replacing `current`, or `None` when there is nothing to increment.
fn next_record(
    name: &str,
    current: Option<&UserValue>,
    upsert: bool,
) -> TallyResult<Option<(Counter, UserValue)>> {
    let counter = match current {
        Some(bytes) => decode(bytes)?,
        None if upsert => Counter::new(name),
        None => return Ok(None),
    };
    let next = counter.incremented()?;
    let value = encode(&next)?;
    Ok(Some((next, value)))
}
