//! Counter store backends and abstractions.
//!
//! The allocator never touches counter state itself; every read-modify-write goes through
//! an [AtomicCounterStoreProvider], the collaborator that owns the counter records and
//! performs the atomic increment-and-fetch.
//!
//! # Storage Providers
//!
//! Providers are produced by a [StoreModule] and loaded through the builder:
//! - **In-Memory Store**: [memory::InMemoryStoreModule] for tests and temporary counters
//! - **Fjall Store**: `tally-fjall-adapter` for persistent, crash-safe counters
//!
//! # Handle
//!
//! [AtomicCounterStore] is a cloneable `Arc` handle over any provider, shared by every
//! allocator clone.

mod counter_store;
pub mod memory;
mod store_module;

pub use counter_store::*;
pub use store_module::*;
