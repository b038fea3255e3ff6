//! Tally Benchmark Library
//!
//! Shared setup for the allocation benchmarks: store factories for each backend and
//! generators for sequence names and records.

pub mod config;
pub mod data_gen;
pub mod stores;
