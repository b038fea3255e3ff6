//! Fjall storage adapter for tally.
//!
//! Provides [FjallModule], a store module persisting counters in a
//! [fjall](https://crates.io/crates/fjall) keyspace. Load it through the tally builder:
//!
//! ```rust,ignore
//! let tally = Tally::builder()
//!     .load_module(FjallModule::with_config().db_path("/path/to/counters").build())
//!     .open()?;
//! ```

mod config;
mod module;
mod store;
mod version;
mod wrapper;

pub use config::*;
pub use module::*;
pub use store::FjallCounterStore;
pub use wrapper::{FjallValue, FjallValueError, FjallValueResult};
