//! The seam to the virtual machine executing the fuzzing transactions.

use crate::{trace::Trace, transaction::SignedTransaction};
use alloy_primitives::{Address, Bytes, U256};

/// Block context a transaction is executed in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockEnv {
    pub number: u64,
    pub timestamp: u64,
    pub gas_limit: u64,
    pub coinbase: Address,
}

impl Default for BlockEnv {
    fn default() -> Self {
        Self {
            number: 1,
            timestamp: 0,
            gas_limit: crate::constants::DEFAULT_BLOCK_GAS_LIMIT,
            coinbase: Address::ZERO,
        }
    }
}

/// Receipt of an applied transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Receipt {
    /// `true` if the transaction did not revert.
    pub status: bool,
    pub gas_used: u64,
    /// The address of the contract created by the transaction, if any.
    pub contract_address: Option<Address>,
}

/// Result of applying a transaction.
#[derive(Clone, Debug, Default)]
pub struct Execution {
    pub receipt: Receipt,
    /// Return or revert data of the top level call.
    pub output: Bytes,
    pub trace: Trace,
}

/// Errors returned by an [`ExecutionBackend`].
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The transaction was not applied, e.g. because the sender cannot pay for it.
    ///
    /// This is an ordinary failure of the fuzzed transaction.
    #[error("transaction rejected: {reason}")]
    Rejected { reason: String },
    /// The backend itself failed.
    #[error("backend failure: {0}")]
    Internal(String),
}

impl BackendError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected { reason: reason.into() }
    }
}

/// A virtual machine holding the world state the fuzzer operates on.
///
/// Execution is synchronous: [`apply_transaction`](Self::apply_transaction) returns once the
/// whole trace is available.
pub trait ExecutionBackend {
    /// A checkpoint of the world state.
    type Snapshot: Clone;

    /// Applies `tx` on top of the current state and returns its receipt and trace.
    fn apply_transaction(
        &mut self,
        tx: &SignedTransaction,
        env: &BlockEnv,
    ) -> Result<Execution, BackendError>;

    /// Captures the current world state.
    fn snapshot(&self) -> Self::Snapshot;

    /// Restores the world state to `snapshot`.
    fn restore(&mut self, snapshot: &Self::Snapshot);

    fn balance(&self, address: Address) -> U256;

    fn nonce(&self, address: Address) -> u64;

    /// Sets the balance of `address`, used to fund the accounts when a session starts.
    fn set_balance(&mut self, address: Address, balance: U256);
}
