use fjall::{CompressionType, Config, PartitionCreateOptions};
use std::sync::atomic::{AtomicBool, AtomicI8, AtomicU16, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tally::common::{atomic, Atomic, ReadExecutor, WriteExecutor};

/// Fjall counter store configuration.
///
/// A cloneable, thread-safe holder for the keyspace and partition settings of a
/// [crate::FjallModule]. Clones share the same settings; scalar settings are atomics,
/// the rest live in `Atomic<T>` cells.
///
/// Usually filled in through `FjallModule::with_config()` rather than directly.
#[derive(Clone)]
pub struct FjallConfig {
    inner: Arc<FjallConfigInner>,
}

impl FjallConfig {
    /// Creates a configuration with default values:
    /// - cache: 64 MB
    /// - write buffer: 128 MB
    /// - max journaling size: 512 MB
    /// - memtable: 32 MB
    /// - bloom filter with 10 bits per key, LZ4 compression
    /// - flush workers: all cores; compaction workers: half of them
    /// - fsync left to fjall, commit on close enabled
    #[inline]
    pub fn new() -> FjallConfig {
        FjallConfig {
            inner: Arc::new(FjallConfigInner::new()),
        }
    }

    /// Translates these settings into fjall's keyspace configuration.
    #[inline]
    pub(crate) fn keyspace_config(&self) -> Config {
        let mut config = Config::new(self.db_path());
        config = config
            .manual_journal_persist(self.manual_journal_persist())
            .flush_workers(self.flush_workers())
            .compaction_workers(self.compaction_workers())
            .cache_size(self.cache_size())
            .max_journaling_size(self.max_journaling_size())
            .max_write_buffer_size(self.max_write_buffer_size());

        if self.fsync_frequency() > 0 {
            config = config.fsync_ms(Some(self.fsync_frequency()));
        }
        config
    }

    /// Translates these settings into options for the counters partition.
    #[inline]
    pub(crate) fn partition_config(&self) -> PartitionCreateOptions {
        PartitionCreateOptions::default()
            .bloom_filter_bits(if self.bloom_filter_bits() < 0 {
                None
            } else {
                Some(self.bloom_filter_bits() as u8)
            })
            .compression(self.compression_type())
            .max_memtable_size(self.max_memtable_size())
            .block_size(self.block_size())
    }

    #[inline]
    pub fn db_path(&self) -> String {
        self.inner.db_path.read_with(|path| path.clone())
    }

    #[inline]
    pub(crate) fn set_db_path(&self, db_path: &str) {
        self.inner.db_path.write_with(|path| *path = db_path.to_string())
    }

    #[inline]
    pub fn manual_journal_persist(&self) -> bool {
        self.inner.manual_journal_persist.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_manual_journal_persist(&self, v: bool) {
        self.inner.manual_journal_persist.store(v, Ordering::Relaxed)
    }

    #[inline]
    pub fn flush_workers(&self) -> usize {
        self.inner.flush_workers_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_flush_workers(&self, c: usize) {
        self.inner.flush_workers_count.store(c, Ordering::Relaxed)
    }

    #[inline]
    pub fn compaction_workers(&self) -> usize {
        self.inner.compaction_workers_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_compaction_workers(&self, c: usize) {
        self.inner.compaction_workers_count.store(c, Ordering::Relaxed)
    }

    /// Block cache size in bytes.
    #[inline]
    pub fn cache_size(&self) -> u64 {
        self.inner.cache_size.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_cache_size(&self, s: u64) {
        self.inner.cache_size.store(s, Ordering::Relaxed)
    }

    #[inline]
    pub fn max_journaling_size(&self) -> u64 {
        self.inner.max_journaling_size.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_max_journaling_size(&self, s: u64) {
        self.inner.max_journaling_size.store(s, Ordering::Relaxed)
    }

    #[inline]
    pub fn max_write_buffer_size(&self) -> u64 {
        self.inner.max_write_buffer_size.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_max_write_buffer_size(&self, s: u64) {
        self.inner.max_write_buffer_size.store(s, Ordering::Relaxed)
    }

    /// Interval in milliseconds of fjall's background fsync; `0` disables it.
    #[inline]
    pub fn fsync_frequency(&self) -> u16 {
        self.inner.fsync_frequency.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_fsync_frequency(&self, f: u16) {
        self.inner.fsync_frequency.store(f, Ordering::Relaxed)
    }

    #[inline]
    pub fn commit_before_close(&self) -> bool {
        self.inner.commit_before_close.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_commit_before_close(&self, v: bool) {
        self.inner.commit_before_close.store(v, Ordering::Relaxed)
    }

    /// Bits per key of the bloom filter; negative disables the filter.
    #[inline]
    pub fn bloom_filter_bits(&self) -> i8 {
        self.inner.bloom_filter_bits.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_bloom_filter_bits(&self, b: i8) {
        self.inner.bloom_filter_bits.store(b, Ordering::Relaxed)
    }

    #[inline]
    pub fn compression_type(&self) -> CompressionType {
        self.inner.compression_type.read_with(|ct| *ct)
    }

    #[inline]
    pub(crate) fn set_compression_type(&self, ct: CompressionType) {
        self.inner.compression_type.write_with(|it| *it = ct)
    }

    #[inline]
    pub fn max_memtable_size(&self) -> u32 {
        self.inner.max_memtable_size.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_max_memtable_size(&self, s: u32) {
        self.inner.max_memtable_size.store(s, Ordering::Relaxed)
    }

    #[inline]
    pub fn block_size(&self) -> u32 {
        self.inner.block_size.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_block_size(&self, s: u32) {
        self.inner.block_size.store(s, Ordering::Relaxed)
    }
}

impl Default for FjallConfig {
    fn default() -> Self {
        Self::new()
    }
}

struct FjallConfigInner {
    db_path: Atomic<String>,
    manual_journal_persist: AtomicBool,
    flush_workers_count: AtomicUsize,
    compaction_workers_count: AtomicUsize,
    cache_size: AtomicU64,
    max_journaling_size: AtomicU64,
    max_write_buffer_size: AtomicU64,
    fsync_frequency: AtomicU16,
    commit_before_close: AtomicBool,

    bloom_filter_bits: AtomicI8,
    compression_type: Atomic<CompressionType>,
    max_memtable_size: AtomicU32,
    block_size: AtomicU32,
}

impl FjallConfigInner {
    pub const DEFAULT_CACHE_MB: u64 = 64;
    pub const DEFAULT_WRITE_BUFFER_MB: u64 = 128;
    pub const DEFAULT_MAX_JOURNALING_MB: u64 = 512;
    pub const DEFAULT_MEMTABLE_MB: u32 = 32;

    fn new() -> FjallConfigInner {
        let cpus = std::thread::available_parallelism()
            .map(usize::from)
            .unwrap_or(4);

        FjallConfigInner {
            db_path: atomic(String::new()),
            manual_journal_persist: AtomicBool::new(false),
            flush_workers_count: AtomicUsize::new(cpus.max(1)),
            compaction_workers_count: AtomicUsize::new((cpus / 2).max(1)),
            cache_size: AtomicU64::new(Self::DEFAULT_CACHE_MB * 1_024 * 1_024),
            max_journaling_size: AtomicU64::new(Self::DEFAULT_MAX_JOURNALING_MB * 1_024 * 1_024),
            max_write_buffer_size: AtomicU64::new(Self::DEFAULT_WRITE_BUFFER_MB * 1_024 * 1_024),
            fsync_frequency: AtomicU16::new(0),
            commit_before_close: AtomicBool::new(true),
            bloom_filter_bits: AtomicI8::new(10),
            compression_type: atomic(CompressionType::Lz4),
            max_memtable_size: AtomicU32::new(Self::DEFAULT_MEMTABLE_MB * 1_024 * 1_024),
            block_size: AtomicU32::new(4 * 1_024),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fjall_config_new() {
        let config = FjallConfig::new();
        assert_eq!(config.db_path(), "");
        assert!(!config.manual_journal_persist());
        assert!(config.flush_workers() >= 1);
        assert!(config.compaction_workers() >= 1);
        assert_eq!(config.cache_size(), 64 * 1024 * 1024);
        assert_eq!(config.max_journaling_size(), 512 * 1024 * 1024);
        assert_eq!(config.max_write_buffer_size(), 128 * 1024 * 1024);
        assert_eq!(config.fsync_frequency(), 0);
        assert!(config.commit_before_close());
        assert_eq!(config.bloom_filter_bits(), 10);
        assert_eq!(config.compression_type(), CompressionType::Lz4);
        assert_eq!(config.max_memtable_size(), 32 * 1024 * 1024);
        assert_eq!(config.block_size(), 4 * 1024);
    }

    #[test]
    fn test_setters_and_getters() {
        let config = FjallConfig::new();
        config.set_db_path("/tmp/counters");
        config.set_manual_journal_persist(true);
        config.set_flush_workers(2);
        config.set_compaction_workers(3);
        config.set_cache_size(1024);
        config.set_max_journaling_size(2048);
        config.set_max_write_buffer_size(4096);
        config.set_fsync_frequency(100);
        config.set_commit_before_close(false);
        config.set_bloom_filter_bits(-1);
        config.set_compression_type(CompressionType::None);
        config.set_max_memtable_size(8192);
        config.set_block_size(16384);

        assert_eq!(config.db_path(), "/tmp/counters");
        assert!(config.manual_journal_persist());
        assert_eq!(config.flush_workers(), 2);
        assert_eq!(config.compaction_workers(), 3);
        assert_eq!(config.cache_size(), 1024);
        assert_eq!(config.max_journaling_size(), 2048);
        assert_eq!(config.max_write_buffer_size(), 4096);
        assert_eq!(config.fsync_frequency(), 100);
        assert!(!config.commit_before_close());
        assert_eq!(config.bloom_filter_bits(), -1);
        assert_eq!(config.compression_type(), CompressionType::None);
        assert_eq!(config.max_memtable_size(), 8192);
        assert_eq!(config.block_size(), 16384);
    }

    #[test]
    fn test_clones_share_settings() {
        let config = FjallConfig::new();
        let clone = config.clone();
        clone.set_db_path("/tmp/shared");
        assert_eq!(config.db_path(), "/tmp/shared");
    }

    #[test]
    fn test_config_building() {
        let config = FjallConfig::new();
        config.set_db_path("/tmp/counters");
        config.set_fsync_frequency(50);
        let _keyspace_config = config.keyspace_config();
        let _partition_config = config.partition_config();
    }
}
