/// Field holding the counter name inside a counter document.
pub const COUNTER_NAME_FIELD: &str = "name";

/// Field holding the last issued value inside a counter document.
pub const COUNTER_SEQ_FIELD: &str = "seq";

/// Name of the map/partition counters are kept in.
pub const COUNTERS_COLLECTION: &str = "counters";

/// Default document field written by `SequenceAllocator::assign_id`.
pub const DEFAULT_ID_FIELD: &str = "id";

/// Version of this crate, reported by store versions.
pub const TALLY_VERSION: &str = env!("CARGO_PKG_VERSION");
