//! Errors that abort a fuzzing session.

use chainfuzz_common::ProjectError;
use chainfuzz_evm_core::BackendError;

/// Faults that make the project unfuzzable.
///
/// Findings and ordinary reverts are never reported through this type.
#[derive(Debug, thiserror::Error)]
pub enum FuzzError {
    #[error(transparent)]
    Project(#[from] ProjectError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("failed to sign transaction: {0}")]
    Signing(#[from] alloy_signer::Error),
    #[error("failed to encode the arguments of `{method}`: {source}")]
    Encode { method: String, source: alloy_dyn_abi::Error },
    #[error("parameter type `{0}` cannot be fuzzed")]
    UnsupportedType(String),
    #[error("no fuzzable contracts were deployed")]
    NoFuzzableContracts,
    #[error("contract `{0}` has no deployed instance")]
    NotDeployed(String),
    #[error("contract `{contract}` has no method `{method}`")]
    UnknownMethod { contract: String, method: String },
}
