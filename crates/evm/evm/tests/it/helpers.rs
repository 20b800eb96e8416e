//! Projects deployed on the mock backend.

use alloy_json_abi::JsonAbi;
use alloy_primitives::{Address, Bytes, Selector, U256};
use chainfuzz_common::{ContractArtifact, DeploymentTx, Project};
use chainfuzz_config::{ContractConfigs, FuzzConfig};
use chainfuzz_evm::FuzzSession;
use chainfuzz_test_utils::{CallContext, MockBackend, MockState, fixtures, traces};
use chainfuzz_evm_core::Execution;

/// Runtime code whose metadata hash is `[tag; 32]`.
pub fn runtime_code(tag: u8) -> Bytes {
    let mut code = vec![0x60, 0x80, 0x60, 0x40, 0x52, 0x00];
    code.extend_from_slice(&[0xa2, 0x65, b'b', b'z', b'z', b'r', b'0', 0x58, 0x20]);
    code.extend_from_slice(&[tag; 32]);
    code.extend_from_slice(&[0x64, b's', b'o', b'l', b'c', 0x43, 0x00, 0x08, 0x11]);
    let metadata_len = (code.len() - 6) as u16;
    code.extend_from_slice(&metadata_len.to_be_bytes());
    code.into()
}

/// A contract deployed by the `index`-th deployment transaction.
pub struct TestContract {
    pub name: &'static str,
    pub abi: JsonAbi,
}

impl TestContract {
    pub fn new(name: &'static str, signatures: &[&str]) -> Self {
        Self { name, abi: JsonAbi::parse(signatures.iter().copied()).unwrap() }
    }

    pub fn selector(&self, method: &str) -> Selector {
        self.abi.function(method).unwrap()[0].selector()
    }
}

/// Address of the contract created by the `index`-th deployment transaction.
pub fn deployed_address(index: u64) -> Address {
    fixtures::ALICE.create(index)
}

/// A project whose contracts are created by Alice, in order.
pub fn project(contracts: &[TestContract], configs: ContractConfigs) -> Project {
    let artifacts = contracts.iter().enumerate().map(|(index, contract)| {
        ContractArtifact::new(contract.name, contract.abi.clone(), runtime_code(index as u8 + 1))
    });
    let deployments = (0..contracts.len() as u64)
        .map(|nonce| DeploymentTx {
            from: fixtures::ALICE,
            to: None,
            nonce,
            value: U256::ZERO,
            gas: 6_000_000,
            gas_price: U256::from(1),
            input: Bytes::from_static(&[0x60, 0x80]),
        })
        .collect();
    Project::new(artifacts, fixtures::accounts(), deployments, configs)
}

/// A backend deploying `count` contracts, one per creation, in order.
pub fn backend(count: usize) -> MockBackend {
    MockBackend::new().with_deployer(move |_, ctx| {
        let index = ctx.nonce as usize;
        assert!(index < count, "unexpected creation");
        traces::deploys(runtime_code(index as u8 + 1))
    })
}

pub fn session(
    project: Project,
    config: FuzzConfig,
    backend: MockBackend,
) -> FuzzSession<MockBackend> {
    FuzzSession::new(project, config, backend).unwrap()
}

/// Selector of the calldata of `ctx`.
pub fn selector(ctx: &CallContext<'_>) -> Option<Selector> {
    ctx.input.get(..4).map(Selector::from_slice)
}

/// Values of the calls sent to `to`, in order.
pub fn values_sent_to(backend: &MockBackend, to: Address) -> Vec<U256> {
    backend
        .applied
        .iter()
        .filter(|(tx, _)| tx.to() == Some(to))
        .map(|(tx, _)| tx.value)
        .collect()
}

/// A contract that reverts every call.
pub fn always_reverts(_: &mut MockState, _: &CallContext<'_>) -> Execution {
    traces::revert()
}
