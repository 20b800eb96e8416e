//! # chainfuzz-config
//!
//! Configuration of the chainfuzz fuzzing engine.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

use figment::{
    Figment, Provider,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::Path;

mod contract;
pub use contract::{ContractConfig, ContractConfigs};

mod error;
pub use error::{ExtractConfigError, FAILED_TO_EXTRACT_CONFIG_MSG};

mod fuzz;
pub use fuzz::{CorpusConfig, DEFAULT_EARLIEST_TIMESTAMP, DEFAULT_LATEST_TIMESTAMP, FuzzConfig};

// reexport so callers can merge their own providers
pub use figment;

impl FuzzConfig {
    /// The default name of the config file.
    pub const FILE_NAME: &'static str = "chainfuzz.toml";

    /// Prefix of the environment variables overriding the config file.
    ///
    /// Nested settings are separated by a double underscore, e.g. `CHAINFUZZ_CORPUS__RANDOM_WORDS`.
    pub const ENV_PREFIX: &'static str = "CHAINFUZZ_";

    /// Returns the [Figment] merging, in increasing priority, the defaults, the `chainfuzz.toml`
    /// file found in `root` and the `CHAINFUZZ_` environment variables.
    pub fn figment_with_root(root: impl AsRef<Path>) -> Figment {
        let toml = root.as_ref().join(Self::FILE_NAME);
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(toml))
            .merge(Env::prefixed(Self::ENV_PREFIX).split("__"))
    }

    /// Loads the config from `root`.
    ///
    /// See [`figment_with_root`](Self::figment_with_root) for the providers that are merged.
    pub fn load_with_root(root: impl AsRef<Path>) -> Result<Self, ExtractConfigError> {
        let root = root.as_ref();
        let config = Self::try_from(Self::figment_with_root(root))?;
        debug!(target: "config", ?root, ?config, "loaded fuzz config");
        Ok(config)
    }

    /// Attempts to extract a config from the given provider.
    pub fn try_from<T: Provider>(provider: T) -> Result<Self, ExtractConfigError> {
        Figment::from(provider).extract::<Self>().map_err(ExtractConfigError::new)
    }
}
