use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per contract fuzzing settings, keyed by contract name.
pub type ContractConfigs = BTreeMap<String, ContractConfig>;

/// Fuzzing settings of a single contract.
///
/// ```json
/// { "Token": { "ignore": ["renounceOwnership"], "timestamps": [1546300800] } }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractConfig {
    /// Do not fuzz the contract at all.
    #[serde(default)]
    pub ignore_all: bool,
    /// Methods of the contract that are never called.
    #[serde(default, rename = "ignore")]
    pub ignored_methods: Vec<String>,
    /// Block timestamps added to the corpus.
    #[serde(default)]
    pub timestamps: Vec<u64>,
}

impl ContractConfig {
    /// Returns `true` if `method` should not be called.
    pub fn ignores(&self, method: &str) -> bool {
        self.ignore_all || self.ignored_methods.iter().any(|ignored| ignored == method)
    }
}
