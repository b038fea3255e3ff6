//! # Tally - Named Sequence Allocation
//!
//! Tally hands out unique, strictly increasing integers for named sequences, typically
//! used as ids for new records. Each sequence is a counter record `{ name, seq }` in a
//! counter store; allocating a value is a single atomic increment-and-fetch on that
//! record, so any number of threads or processes sharing the store get distinct values
//! without coordinating with each other.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tally::tally::Tally;
//! use tally::doc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let tally = Tally::builder()
//!     .provision("cities")
//!     .open()?;
//!
//! let sequences = tally.sequences();
//! assert_eq!(sequences.next("cities")?, 1);
//! assert_eq!(sequences.next("cities")?, 2);
//!
//! let mut city = doc! { name: "Oslo" };
//! sequences.assign_id("cities", &mut city)?;
//! assert_eq!(city.get("id").as_u64(), Some(3));
//!
//! tally.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`common`] - Document and value model, constants, shared utilities
//! - [`counter`] - The counter record
//! - [`errors`] - Error types and result definitions
//! - [`sequence`] - The sequence allocator and bootstrap policy
//! - [`store`] - Counter store abstractions and the in-memory store
//! - [`tally`] - Top-level handle
//! - [`tally_builder`] - Builder for opening a handle
//! - [`tally_config`] - Handle configuration

pub mod common;
pub mod counter;
pub mod errors;
pub mod sequence;
pub mod store;
pub mod tally;
pub mod tally_builder;
pub mod tally_config;

#[cfg(test)]
mod tests {
    // Setup only one time throughout the project.
    // It will take effect during test, project wide
    #[ctor::ctor]
    fn init() {
        colog::init();
    }
}
