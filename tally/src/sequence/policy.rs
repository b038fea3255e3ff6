use std::fmt::{Display, Formatter};

/// How the allocator treats a sequence name that has no counter yet.
///
/// The two policies are not equivalent when several callers use a fresh name at the same
/// time, so the choice is explicit:
///
/// - [BootstrapPolicy::Strict]: counters are provisioned up front (builder `provision`, or
///   `SequenceAllocator::provision`), and `next` on an unknown name fails with `NotFound`.
/// - [BootstrapPolicy::UpsertOnFirstUse]: `next` on an unknown name creates the counter at
///   `seq = 0` and increments it inside the same atomic store call, so racing first callers
///   receive `1`, `2`, ... and never create the counter twice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BootstrapPolicy {
    #[default]
    Strict,
    UpsertOnFirstUse,
}

impl BootstrapPolicy {
    #[inline]
    pub fn upsert(&self) -> bool {
        matches!(self, BootstrapPolicy::UpsertOnFirstUse)
    }
}

impl Display for BootstrapPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BootstrapPolicy::Strict => write!(f, "strict"),
            BootstrapPolicy::UpsertOnFirstUse => write!(f, "upsert-on-first-use"),
        }
    }
}
