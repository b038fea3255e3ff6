//! Common types shared by every tally module.
//!
//! - [`Value`] and [`Document`]: the schema-free record model counters are stored as
//! - [`Atomic`]: `parking_lot`-backed shared cells used by configuration holders
//! - constants for the counter document layout

mod constants;
mod document;
mod type_utils;
mod value;

pub use constants::*;
pub use document::*;
pub use type_utils::*;
pub use value::*;
