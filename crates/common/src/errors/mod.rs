//! Commonly used errors

mod fs;
pub use fs::FsPathError;

use alloy_primitives::{Address, hex};
use alloy_signer_local::LocalSignerError;
use chainfuzz_config::ExtractConfigError;
use std::path::PathBuf;

/// Errors raised while loading a project.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error(transparent)]
    Fs(#[from] FsPathError),
    #[error(transparent)]
    Config(#[from] ExtractConfigError),
    /// A line of the deployment transaction log could not be parsed.
    #[error("invalid deployment transaction on line {line} of {path:?}: {source}")]
    DeploymentTx { source: serde_json::Error, path: PathBuf, line: usize },
    /// The bytecode of an artifact is not valid hex, even after its link placeholders were
    /// replaced.
    #[error("invalid bytecode of contract `{contract}`: {source}")]
    Bytecode { contract: String, source: hex::FromHexError },
    #[error("invalid private key of account #{index}: {source}")]
    PrivateKey { index: usize, source: LocalSignerError },
    #[error("no accounts configured")]
    NoAccounts,
    #[error("{0} is not a configured account")]
    UnknownAccount(Address),
    #[error("contract `{0}` not found in the project artifacts")]
    UnknownContract(String),
}
