use crate::errors::{TallyError, TallyResult};
use crate::sequence::BootstrapPolicy;
use crate::store::StoreModule;
use crate::tally::Tally;
use crate::tally_config::TallyConfig;

/// Builder for opening a [Tally] instance.
///
/// Configuration errors are captured as they happen and returned from
/// [TallyBuilder::open], so the whole chain can be written without intermediate `?`.
///
/// # Examples
///
/// ```rust,ignore
/// use tally::tally::Tally;
/// use tally::sequence::BootstrapPolicy;
///
/// // in-memory store, counters provisioned up front
/// let tally = Tally::builder()
///     .provision("cities")
///     .provision("orders")
///     .open()?;
///
/// // counters created on first use, ids written to "_id"
/// let tally = Tally::builder()
///     .bootstrap_policy(BootstrapPolicy::UpsertOnFirstUse)
///     .id_field("_id")
///     .open()?;
/// ```
#[derive(Default)]
pub struct TallyBuilder {
    error: Option<TallyError>,
    tally_config: TallyConfig,
}

impl TallyBuilder {
    /// Creates a builder with the default configuration: strict bootstrap, `id` as the id
    /// field, and the in-memory store unless another store module is loaded.
    pub fn new() -> Self {
        TallyBuilder {
            error: None,
            tally_config: TallyConfig::new(),
        }
    }

    /// Loads the store module the counters live in, e.g. `FjallModule`.
    ///
    /// Only one store module can be loaded; a second one is reported by `open`.
    pub fn load_module<T: StoreModule + 'static>(mut self, module: T) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.tally_config.load_module(module) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn bootstrap_policy(self, policy: BootstrapPolicy) -> Self {
        self.tally_config.set_bootstrap_policy(policy);
        self
    }

    /// Sets the document field `assign_id` writes to. Must not be blank.
    pub fn id_field(mut self, field: &str) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.tally_config.set_id_field(field) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Makes sure a counter for `name` exists once the store is open.
    ///
    /// Existing counters keep their value, so the same provisioning list can be used on
    /// every start.
    pub fn provision(mut self, name: &str) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.tally_config.add_provisioned_name(name) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Opens the store and provisions the configured counters.
    ///
    /// Returns the first configuration error, if any, or the error raised while opening.
    pub fn open(self) -> TallyResult<Tally> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.tally_config.auto_configure()?;
        Tally::open(self.tally_config)
    }
}
