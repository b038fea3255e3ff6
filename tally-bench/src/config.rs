//! Benchmark configuration

use std::path::PathBuf;

/// Storage backend type for benchmarks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreType {
    /// In-memory counters, lost on close
    InMemory,
    /// Fjall persistent counters
    Fjall,
}

impl StoreType {
    pub fn all() -> [StoreType; 2] {
        [StoreType::InMemory, StoreType::Fjall]
    }
}

impl std::fmt::Display for StoreType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreType::InMemory => write!(f, "inmemory"),
            StoreType::Fjall => write!(f, "fjall"),
        }
    }
}

/// Configuration for benchmark runs
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Base path for temporary keyspaces
    pub base_path: PathBuf,
    /// Allocations per measured iteration
    pub allocation_counts: Vec<usize>,
    /// Thread counts for contention benchmarks
    pub thread_counts: Vec<usize>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            base_path: std::env::temp_dir().join("tally-bench"),
            allocation_counts: vec![100, 1_000, 10_000],
            thread_counts: vec![2, 4, 8],
        }
    }
}

impl BenchmarkConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quick config with smaller counts for fast testing
    pub fn quick() -> Self {
        Self {
            allocation_counts: vec![100, 1_000],
            thread_counts: vec![2, 4],
            ..Default::default()
        }
    }

    /// Thread counts the current machine can reasonably run.
    pub fn usable_thread_counts(&self) -> Vec<usize> {
        let limit = num_cpus::get() * 2;
        self.thread_counts
            .iter()
            .copied()
            .filter(|count| *count <= limit)
            .collect()
    }
}
