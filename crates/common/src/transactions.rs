//! Recorded deployment transactions.

use crate::{
    errors::ProjectError,
    fs,
    serde_helpers::{deserialize_recipient, from_int_or_hex},
};
use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Deserializer};
use std::path::Path;

/// A transaction sent while deploying the project, as logged by the development node.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentTx {
    pub from: Address,
    /// Recipient of the transaction, `None` for contract creations.
    #[serde(default, deserialize_with = "deserialize_recipient")]
    pub to: Option<Address>,
    pub nonce: u64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub value: U256,
    #[serde(default)]
    pub gas: u64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub gas_price: U256,
    #[serde(default)]
    pub input: Bytes,
}

impl DeploymentTx {
    /// Returns `true` if the transaction creates a contract.
    pub fn is_create(&self) -> bool {
        self.to.is_none()
    }
}

/// Amounts that cannot be parsed are treated as zero.
fn lenient_amount<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(from_int_or_hex(deserializer).unwrap_or_default())
}

/// Reads the deployment transactions at `path`, one JSON object per line.
pub fn read_deployment_txs(path: &Path) -> Result<Vec<DeploymentTx>, ProjectError> {
    let content = fs::read_to_string(path)?;
    parse_deployment_txs(&content, path)
}

fn parse_deployment_txs(content: &str, path: &Path) -> Result<Vec<DeploymentTx>, ProjectError> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|source| ProjectError::DeploymentTx {
                source,
                path: path.to_path_buf(),
                line: index + 1,
            })
        })
        .collect()
}
