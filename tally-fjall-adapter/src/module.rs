use crate::config::FjallConfig;
use crate::store::FjallCounterStore;
use fjall::CompressionType;
use tally::errors::TallyResult;
use tally::store::{AtomicCounterStore, StoreModule};

/// Store module keeping counters in a Fjall keyspace on disk.
///
/// Counters survive process restarts and are shared by every handle opened on the same
/// path in this process.
///
/// # Examples
///
/// ```rust,ignore
/// use tally::tally::Tally;
/// use tally_fjall_adapter::FjallModule;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let tally = Tally::builder()
///     .load_module(
///         FjallModule::with_config()
///             .production_preset()
///             .db_path("/path/to/counters")
///             .build(),
///     )
///     .provision("cities")
///     .open()?;
/// # Ok(())
/// # }
/// ```
///
/// # Configuration Presets
///
/// - `production_preset()` - periodic fsync and a larger cache
/// - `low_memory_preset()` - small caches and buffers, single workers
pub struct FjallModule {
    store_config: FjallConfig,
}

impl FjallModule {
    #[inline]
    pub fn with_config() -> FjallModuleBuilder {
        FjallModuleBuilder::new()
    }

    pub fn config(&self) -> FjallConfig {
        self.store_config.clone()
    }
}

impl StoreModule for FjallModule {
    fn get_store(&self) -> TallyResult<AtomicCounterStore> {
        let store = FjallCounterStore::new(self.store_config.clone());
        Ok(AtomicCounterStore::new(store))
    }
}

/// Builder for a [FjallModule].
pub struct FjallModuleBuilder {
    store_config: FjallConfig,
}

impl FjallModuleBuilder {
    #[inline]
    pub fn new() -> FjallModuleBuilder {
        FjallModuleBuilder {
            store_config: FjallConfig::new(),
        }
    }

    /// Applies production settings.
    ///
    /// This configures:
    /// - 256 MB cache
    /// - 128 MB write buffer, 32 MB memtable
    /// - all cores for flush workers, half for compaction
    /// - 100ms fsync interval
    /// - LZ4 compression
    #[inline]
    pub fn production_preset(self) -> Self {
        let cpus = std::thread::available_parallelism()
            .map(usize::from)
            .unwrap_or(4);

        self.cache_size(256 * 1024 * 1024)
            .max_write_buffer_size(128 * 1024 * 1024)
            .max_memtable_size(32 * 1024 * 1024)
            .flush_workers(cpus)
            .compaction_workers((cpus / 2).max(1))
            .bloom_filter_bits(10)
            .fsync_frequency(100)
            .compression_type(CompressionType::Lz4)
    }

    /// Applies settings for memory-constrained environments at some cost in throughput.
    #[inline]
    pub fn low_memory_preset(self) -> Self {
        self.cache_size(16 * 1024 * 1024)
            .max_write_buffer_size(32 * 1024 * 1024)
            .max_memtable_size(8 * 1024 * 1024)
            .flush_workers(1)
            .compaction_workers(1)
            .bloom_filter_bits(10)
    }

    #[inline]
    pub fn db_path(self, db_path: &str) -> Self {
        self.store_config.set_db_path(db_path);
        self
    }

    /// With manual journal persistence, counter updates are only durable after `commit`.
    #[inline]
    pub fn manual_journal_persist(self, manual_journal_persist: bool) -> Self {
        self.store_config
            .set_manual_journal_persist(manual_journal_persist);
        self
    }

    #[inline]
    pub fn flush_workers(self, flush_workers_count: usize) -> Self {
        self.store_config.set_flush_workers(flush_workers_count);
        self
    }

    #[inline]
    pub fn compaction_workers(self, compaction_workers_count: usize) -> Self {
        self.store_config
            .set_compaction_workers(compaction_workers_count);
        self
    }

    #[inline]
    pub fn cache_size(self, cache_size: u64) -> Self {
        self.store_config.set_cache_size(cache_size);
        self
    }

    #[inline]
    pub fn max_journaling_size(self, max_journaling_size: u64) -> Self {
        self.store_config.set_max_journaling_size(max_journaling_size);
        self
    }

    #[inline]
    pub fn max_write_buffer_size(self, max_write_buffer_size: u64) -> Self {
        self.store_config
            .set_max_write_buffer_size(max_write_buffer_size);
        self
    }

    #[inline]
    pub fn fsync_frequency(self, fsync_frequency: u16) -> Self {
        self.store_config.set_fsync_frequency(fsync_frequency);
        self
    }

    #[inline]
    pub fn commit_before_close(self, commit_before_close: bool) -> Self {
        self.store_config.set_commit_before_close(commit_before_close);
        self
    }

    /// Bits per key of the counters partition's bloom filter, capped at `i8::MAX`.
    #[inline]
    pub fn bloom_filter_bits(self, bloom_filter_bits: u8) -> Self {
        let bits = i8::try_from(bloom_filter_bits).unwrap_or(i8::MAX);
        self.store_config.set_bloom_filter_bits(bits);
        self
    }

    #[inline]
    pub fn disable_bloom_filter(self) -> Self {
        self.store_config.set_bloom_filter_bits(-1);
        self
    }

    #[inline]
    pub fn compression_type(self, compression_type: CompressionType) -> Self {
        self.store_config.set_compression_type(compression_type);
        self
    }

    #[inline]
    pub fn max_memtable_size(self, max_memtable_size: u32) -> Self {
        self.store_config.set_max_memtable_size(max_memtable_size);
        self
    }

    #[inline]
    pub fn block_size(self, block_size: u32) -> Self {
        self.store_config.set_block_size(block_size);
        self
    }

    #[inline]
    pub fn build(self) -> FjallModule {
        FjallModule {
            store_config: self.store_config,
        }
    }
}

impl Default for FjallModuleBuilder {
    fn default() -> Self {
        Self::new()
    }
}
