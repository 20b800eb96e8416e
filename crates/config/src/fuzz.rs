//! Configuration for fuzzing campaigns.

use serde::{Deserialize, Serialize};

/// 2015-01-01T00:00:00Z
pub const DEFAULT_EARLIEST_TIMESTAMP: u64 = 1_420_070_400;
/// 2035-01-01T00:00:00Z
pub const DEFAULT_LATEST_TIMESTAMP: u64 = 2_051_222_400;

/// Contains the settings of a fuzzing campaign.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzConfig {
    /// Number of transactions to send in the main loop, retries included.
    pub limit: u64,
    /// Optional seed for the fuzzing RNG.
    pub seed: Option<u64>,
    /// Retry a reverted transaction with half of the value it sent.
    pub retry_half_value: bool,
    /// Retry a reverted transaction from a freshly sampled sender.
    pub retry_different_sender: bool,
    /// Periodically revert the world state to the session snapshot.
    pub snapshots: bool,
    /// Keep per contract/method failure statistics.
    pub statistics: bool,
    /// Maximum depth of the retry tree grown from a single round.
    pub max_retry_depth: u32,
    /// Number of transactions sent under one block timestamp before the next timestamp from the
    /// corpus is used.
    pub timestamp_interval: u64,
    /// Number of rounds between two snapshot reversions, if `snapshots` is enabled.
    pub snapshot_revert_interval: u64,
    /// Name prefix of the invariant probe methods.
    pub invariant_prefix: String,
    /// Send a fallback call to every contract and one wei to every non-payable method before the
    /// main loop.
    pub corner_cases: bool,
    /// Harvest timestamps from the stack of every fuzzing transaction.
    ///
    /// Timestamps are always harvested while replaying deployments.
    pub harvest_timestamps: bool,
    /// Gas limit of every generated transaction.
    pub gas_limit: u64,
    /// Deployed contracts that are never fuzzed.
    pub excluded_contracts: Vec<String>,
    /// The value corpus configuration
    pub corpus: CorpusConfig,
}

impl Default for FuzzConfig {
    fn default() -> Self {
        Self {
            limit: 10_000,
            seed: None,
            retry_half_value: false,
            retry_different_sender: false,
            snapshots: false,
            statistics: false,
            max_retry_depth: 4,
            timestamp_interval: 2048,
            snapshot_revert_interval: 8192,
            invariant_prefix: "fuzz_always_true".to_string(),
            corner_cases: true,
            harvest_timestamps: false,
            gas_limit: 8_000_000,
            excluded_contracts: vec!["Migrations".to_string()],
            corpus: CorpusConfig::default(),
        }
    }
}

impl FuzzConfig {
    /// Retry with half the value when a transaction reverts.
    pub const OPT_RETRY_HALF_VALUE: u32 = 1;
    /// Retry with a different sender when a transaction reverts.
    pub const OPT_RETRY_DIFFERENT_SENDER: u32 = 1 << 1;
    /// Snapshot the state and revert to it periodically.
    pub const OPT_SNAPSHOTS: u32 = 1 << 2;
    /// Collect per method statistics.
    pub const OPT_STATISTICS: u32 = 1 << 3;

    /// Enables the heuristics encoded in the `bits` optimization mode.
    ///
    /// Bits are read from the least significant one: halve value on revert, retry with a different
    /// sender, snapshots, statistics. Unset bits leave the current setting untouched.
    pub fn with_opt_mode(mut self, bits: u32) -> Self {
        self.retry_half_value |= bits & Self::OPT_RETRY_HALF_VALUE != 0;
        self.retry_different_sender |= bits & Self::OPT_RETRY_DIFFERENT_SENDER != 0;
        self.snapshots |= bits & Self::OPT_SNAPSHOTS != 0;
        self.statistics |= bits & Self::OPT_STATISTICS != 0;
        self
    }

    /// Returns `true` if `method` is an invariant probe.
    pub fn is_invariant_probe(&self, method: &str) -> bool {
        method.starts_with(&self.invariant_prefix)
    }
}

/// Contains the settings of the value corpus.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Number of random 32 byte words added when seeding.
    pub random_words: usize,
    /// String added to the string pool when seeding.
    pub marker_string: String,
    /// Maximum length of generated dynamic arrays and byte strings.
    pub max_sequence_len: usize,
    /// How many values are drawn from the integer pool when looking for an amount the sender can
    /// afford, before falling back to zero.
    pub payable_sample_attempts: usize,
    /// Lower bound (exclusive) of stack values treated as block timestamps.
    pub earliest_timestamp: u64,
    /// Upper bound (exclusive) of stack values treated as block timestamps.
    pub latest_timestamp: u64,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            random_words: 10,
            marker_string: "chainfuzz".to_string(),
            max_sequence_len: 16,
            payable_sample_attempts: 256,
            earliest_timestamp: DEFAULT_EARLIEST_TIMESTAMP,
            latest_timestamp: DEFAULT_LATEST_TIMESTAMP,
        }
    }
}

impl CorpusConfig {
    /// Returns `true` if `value` lies strictly inside the plausible timestamp range.
    pub fn is_plausible_timestamp(&self, value: u64) -> bool {
        value > self.earliest_timestamp && value < self.latest_timestamp
    }
}
