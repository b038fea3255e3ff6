//! Store factory functions for benchmarks

use crate::config::StoreType;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tally::sequence::BootstrapPolicy;
use tally::tally::Tally;
use tally_fjall_adapter::FjallModule;
use uuid::Uuid;

/// Setup errors from either tally or the filesystem
pub type StoreResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Keyspaces opened so far in this run
static KEYSPACE_SERIAL: AtomicU64 = AtomicU64::new(0);

/// `<workspace>/bench-data`, shared by every benchmark binary
fn bench_data_dir() -> PathBuf {
    let crate_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    match crate_dir.parent() {
        Some(workspace) => workspace.join("bench-data"),
        None => crate_dir.join("bench-data"),
    }
}

fn next_keyspace_path() -> PathBuf {
    let dir = bench_data_dir();
    if let Err(e) = std::fs::create_dir_all(&dir) {
        log::warn!("Failed to create {}: {}", dir.display(), e);
    }

    let serial = KEYSPACE_SERIAL.fetch_add(1, Ordering::SeqCst);
    dir.join(format!("counters_{}_{}", serial, Uuid::new_v4().simple()))
}

/// A tally opened for one benchmark iteration; closed and deleted on drop
pub struct BenchContext {
    tally: Tally,
    db_path: Option<PathBuf>,
}

impl BenchContext {
    pub fn tally(&self) -> &Tally {
        &self.tally
    }
}

impl Drop for BenchContext {
    fn drop(&mut self) {
        if let Err(e) = self.tally.close() {
            log::warn!("Failed to close bench tally: {}", e);
        }
        if let Some(path) = self.db_path.take() {
            let _ = std::fs::remove_dir_all(path);
        }
    }
}

/// Removes keyspaces left behind by aborted runs
pub fn cleanup_all_bench_data() {
    let dir = bench_data_dir();
    if dir.exists() {
        if let Err(e) = std::fs::remove_dir_all(&dir) {
            log::warn!("Failed to clean {}: {}", dir.display(), e);
        }
    }
}

/// Create an in-memory tally
pub fn create_inmemory_tally(policy: BootstrapPolicy) -> StoreResult<BenchContext> {
    let tally = Tally::builder().bootstrap_policy(policy).open()?;
    Ok(BenchContext {
        tally,
        db_path: None,
    })
}

/// Create a fjall-backed tally
pub fn create_fjall_tally(policy: BootstrapPolicy) -> StoreResult<BenchContext> {
    let db_path = next_keyspace_path();
    let path = db_path
        .to_str()
        .ok_or("benchmark path is not valid UTF-8")?
        .to_string();

    let fjall_module = FjallModule::with_config().db_path(&path).build();
    let tally = Tally::builder()
        .load_module(fjall_module)
        .bootstrap_policy(policy)
        .open()?;

    Ok(BenchContext {
        tally,
        db_path: Some(db_path),
    })
}

/// Create a tally on the given backend
pub fn create_tally(store_type: StoreType, policy: BootstrapPolicy) -> StoreResult<BenchContext> {
    log::debug!("Creating {} tally with {} bootstrap", store_type, policy);
    match store_type {
        StoreType::InMemory => create_inmemory_tally(policy),
        StoreType::Fjall => create_fjall_tally(policy),
    }
}
