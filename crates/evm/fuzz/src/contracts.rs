//! The contracts deployed in a session and the methods that are fuzzed on them.

use crate::FuzzError;
use alloy_json_abi::{Function, JsonAbi, StateMutability};
use alloy_primitives::{Address, B256, map::B256HashMap};
use chainfuzz_common::Project;
use chainfuzz_config::FuzzConfig;
use rand::{Rng, seq::IndexedRandom};
use std::collections::BTreeMap;

/// Method name of a call with empty calldata.
pub const FALLBACK: &str = "fallback";

/// A contract with at least one deployed instance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeployedContract {
    /// Instances in deployment order. Transactions are sent to the first one.
    pub addresses: Vec<Address>,
    /// Names of the methods that may be called.
    pub methods: Vec<String>,
}

/// Registry of deployed contracts, keyed by contract name.
#[derive(Clone, Debug, Default)]
pub struct DeployedContracts {
    abis: BTreeMap<String, JsonAbi>,
    hashes: B256HashMap<String>,
    deployed: BTreeMap<String, DeployedContract>,
    /// Contracts transactions are generated for.
    fuzzable: Vec<String>,
}

impl DeployedContracts {
    /// Creates an empty registry knowing the ABIs and metadata hashes of `project`.
    pub fn new(project: &Project) -> Self {
        let abis = project
            .artifacts
            .iter()
            .map(|(name, artifact)| (name.clone(), artifact.abi.clone()))
            .collect();
        Self { abis, hashes: project.metadata_hashes(), ..Default::default() }
    }

    /// Resolves a metadata hash found in deployed code to a contract name.
    pub fn contract_by_hash(&self, hash: &B256) -> Option<&str> {
        self.hashes.get(hash).map(String::as_str)
    }

    /// Records a new instance of `name` at `address`.
    pub fn register(&mut self, name: &str, address: Address) {
        trace!(target: "contracts", name, %address, "deployed contract");
        self.deployed.entry(name.to_string()).or_default().addresses.push(address);
    }

    /// Builds the method lists and the list of fuzzable contracts.
    ///
    /// Libraries, excluded contracts, ignored methods and contracts left without methods are
    /// dropped. Methods are listed in name order, overloads sharing one entry.
    pub fn finalize(&mut self, project: &Project, config: &FuzzConfig) -> Result<(), FuzzError> {
        self.deployed.retain(|name, contract| {
            if project.is_library(name) {
                debug!(target: "contracts", name, "removing library from deployed contracts");
                return false;
            }
            if config.excluded_contracts.iter().any(|excluded| excluded == name) {
                debug!(target: "contracts", name, "excluding contract");
                return false;
            }
            let contract_config = project.contract_configs.get(name);
            if contract_config.is_some_and(|c| c.ignore_all) {
                debug!(target: "contracts", name, "ignoring contract");
                return false;
            }

            contract.methods = self
                .abis
                .get(name)
                .into_iter()
                .flat_map(|abi| abi.functions.keys())
                .filter(|method| {
                    let ignored = contract_config.is_some_and(|c| c.ignores(method));
                    if ignored {
                        debug!(target: "contracts", name, %method, "ignoring method");
                    }
                    !ignored
                })
                .cloned()
                .collect();
            !contract.methods.is_empty()
        });

        self.fuzzable = self.deployed.keys().cloned().collect();
        if self.fuzzable.is_empty() {
            return Err(FuzzError::NoFuzzableContracts);
        }
        debug!(target: "contracts", fuzzable = ?self.fuzzable, "finalized deployed contracts");
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&DeployedContract> {
        self.deployed.get(name)
    }

    /// Iterates over the deployed contracts in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &DeployedContract)> {
        self.deployed.iter()
    }

    /// Names of the contracts transactions are generated for.
    pub fn fuzzable(&self) -> &[String] {
        &self.fuzzable
    }

    pub fn random_contract<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        self.fuzzable.choose(rng).map(String::as_str)
    }

    pub fn random_method<R: Rng + ?Sized>(&self, contract: &str, rng: &mut R) -> Option<&str> {
        self.deployed.get(contract)?.methods.choose(rng).map(String::as_str)
    }

    /// Address transactions to `contract` are sent to.
    pub fn address(&self, contract: &str) -> Result<Address, FuzzError> {
        self.deployed
            .get(contract)
            .and_then(|deployed| deployed.addresses.first().copied())
            .ok_or_else(|| FuzzError::NotDeployed(contract.to_string()))
    }

    /// Returns the ABI of `method`, or `None` for the fallback.
    pub fn function(&self, contract: &str, method: &str) -> Result<Option<&Function>, FuzzError> {
        if method == FALLBACK {
            return Ok(None);
        }
        self.abis
            .get(contract)
            .and_then(|abi| abi.function(method))
            .and_then(|overloads| overloads.first())
            .map(Some)
            .ok_or_else(|| FuzzError::UnknownMethod {
                contract: contract.to_string(),
                method: method.to_string(),
            })
    }

    /// Returns `true` if calling `method` may transfer value.
    pub fn is_payable(&self, contract: &str, method: &str) -> bool {
        let Some(abi) = self.abis.get(contract) else { return false };
        if method == FALLBACK {
            return abi.receive.is_some()
                || abi
                    .fallback
                    .as_ref()
                    .is_some_and(|f| f.state_mutability == StateMutability::Payable);
        }
        abi.function(method)
            .and_then(|overloads| overloads.first())
            .is_some_and(|f| f.state_mutability == StateMutability::Payable)
    }
}
