use crate::helpers::*;
use alloy_primitives::U256;
use chainfuzz_config::{ContractConfig, ContractConfigs, FuzzConfig};
use chainfuzz_evm::{backend::ExecutionBackend, fuzz::FuzzError};
use chainfuzz_test_utils::{MockBackend, fixtures, traces};
use similar_asserts::assert_eq;

fn counter() -> TestContract {
    TestContract::new("Counter", &["function bump()", "function count() view returns (uint256)"])
}

/// Increments slot zero on every call.
fn counting_backend() -> MockBackend {
    let address = deployed_address(0);
    backend(1).with_handler(address, move |state, _| {
        let count = state.load(address, U256::ZERO);
        state.store(address, U256::ZERO, count + U256::from(1));
        traces::stop()
    })
}

fn count(session: &chainfuzz_evm::FuzzSession<MockBackend>) -> U256 {
    session.backend().state().load(deployed_address(0), U256::ZERO)
}

#[test]
fn bootstrap_deploys_and_seeds() {
    let configs = ContractConfigs::from([(
        "Counter".to_string(),
        ContractConfig { timestamps: vec![1_600_000_000], ..Default::default() },
    )]);
    let project = project(&[counter()], configs);
    let session = session(project, FuzzConfig::default(), counting_backend());

    let deployed = session.contracts().get("Counter").unwrap();
    assert_eq!(deployed.addresses, vec![deployed_address(0)]);
    assert_eq!(deployed.methods, vec!["bump".to_string(), "count".to_string()]);
    assert_eq!(session.contracts().fuzzable(), ["Counter".to_string()]);

    assert_eq!(session.backend().balance(fixtures::BOB), fixtures::INITIAL_BALANCE);
    assert!(session.corpus().addresses.contains(&deployed_address(0)));
    assert!(session.corpus().addresses.contains(&fixtures::BOB));
    assert_eq!(session.corpus().timestamps.as_slice(), &[1_600_000_000]);
    assert_eq!(session.tx_count(), 0);
    // creations have no address to attribute coverage to
    assert!(session.coverage().is_empty());
}

#[test]
fn unknown_deployer_is_fatal() {
    let mut project = project(&[counter()], Default::default());
    project.deployments[0].from = alloy_primitives::Address::with_last_byte(9);
    let err = chainfuzz_evm::FuzzSession::new(project, FuzzConfig::default(), backend(1))
        .err()
        .unwrap();
    assert!(matches!(err, FuzzError::Project(_)), "{err}");
}

#[test]
fn nothing_deployed_is_fatal() {
    let mut project = project(&[counter()], Default::default());
    project.deployments.clear();
    let err = chainfuzz_evm::FuzzSession::new(project, FuzzConfig::default(), MockBackend::new())
        .err()
        .unwrap();
    assert!(matches!(err, FuzzError::NoFuzzableContracts), "{err}");
}

#[test]
fn timestamps_advance_every_interval_and_laps_revert() {
    let (t1, t2) = (1_600_000_000, 1_700_000_000);
    let configs = ContractConfigs::from([(
        "Counter".to_string(),
        ContractConfig { timestamps: vec![t2, t1], ..Default::default() },
    )]);
    let config = FuzzConfig { timestamp_interval: 2, seed: Some(3), ..Default::default() };
    let mut session = session(project(&[counter()], configs), config, counting_backend());

    for _ in 0..6 {
        session.run_round(chainfuzz_evm::fuzz::Hint::call("Counter", "bump")).unwrap();
    }

    let timestamps: Vec<u64> = session
        .backend()
        .applied
        .iter()
        .filter(|(tx, _)| tx.to().is_some())
        .map(|(_, env)| env.timestamp)
        .collect();
    assert_eq!(timestamps, vec![t1, t1, t2, t2, t1, t1]);
    assert_eq!(session.backend().restores, 1);
    // the lap reverted the four earlier bumps
    assert_eq!(count(&session), U256::from(2));
}

#[test]
fn snapshots_revert_every_interval() {
    let config = FuzzConfig {
        snapshots: true,
        snapshot_revert_interval: 3,
        seed: Some(5),
        ..Default::default()
    };
    let project = project(&[counter()], Default::default());
    let mut session = session(project, config, counting_backend());

    session.run_rounds(7).unwrap();
    assert_eq!(session.tx_count(), 7);
    assert_eq!(session.backend().restores, 2);
    assert_eq!(count(&session), U256::from(1));
    // nonces are restored with the state
    assert_eq!(
        session.backend().nonce(fixtures::ALICE) + session.backend().nonce(fixtures::BOB),
        2
    );
}

#[test]
fn sessions_are_independent() {
    let config = FuzzConfig { seed: Some(11), ..Default::default() };
    let project = project(&[counter()], Default::default());
    let mut first = session(project.clone(), config.clone(), counting_backend());
    let second = session(project, config, counting_backend());

    first.run_rounds(10).unwrap();
    assert_eq!(first.tx_count(), 10);
    assert_eq!(second.tx_count(), 0);
    assert_eq!(count(&second), U256::ZERO);
    assert_eq!(first.corpus().sizes().address, second.corpus().sizes().address);
}
