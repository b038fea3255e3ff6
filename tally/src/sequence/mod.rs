//! Sequence allocation on top of a counter store.
//!
//! [SequenceAllocator] is the entry point; [BootstrapPolicy] decides how names without a
//! counter are treated.

mod allocator;
mod policy;

pub use allocator::*;
pub use policy::*;
