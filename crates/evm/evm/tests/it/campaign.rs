use crate::helpers::*;
use alloy_primitives::{U256, hex};
use chainfuzz_config::FuzzConfig;
use chainfuzz_evm::{FuzzSession, run_campaign};
use chainfuzz_test_utils::{MockBackend, fixtures, init_tracing, traces};
use similar_asserts::assert_eq;

/// Deposits above this amount break the solvency probe.
const CAP: u128 = 1_000_000_000_000_000_000;

fn vault() -> TestContract {
    TestContract::new(
        "Vault",
        &[
            "function deposit() payable",
            "function withdraw(uint256 amount)",
            "function fuzz_always_true_solvent() view returns (bool)",
        ],
    )
}

fn vault_backend(vault: &TestContract) -> MockBackend {
    let address = deployed_address(0);
    let (deposit, probe) = (vault.selector("deposit"), vault.selector("fuzz_always_true_solvent"));
    backend(1).with_handler(address, move |state, ctx| {
        let deposits = state.load(address, U256::ZERO);
        match selector(ctx) {
            Some(s) if s == deposit => {
                state.store(address, U256::ZERO, deposits + ctx.value);
                traces::stop()
            }
            Some(s) if s == probe => traces::returns_bool(deposits < U256::from(CAP)),
            Some(_) if ctx.value.is_zero() => traces::stop(),
            _ => traces::revert(),
        }
    })
}

#[test]
fn property_violation_ends_the_campaign() {
    init_tracing();
    let vault = vault();
    let backend = vault_backend(&vault);
    let config = FuzzConfig { seed: Some(42), statistics: true, ..Default::default() };
    let mut session = session(project(&[vault], Default::default()), config, backend);

    let report = session.run().unwrap();

    assert!(report.terminated);
    assert!(report.transactions < 10_000, "{}", report.transactions);
    let vault_results = &report.results["Vault"];
    assert_eq!(
        vault_results["fuzz_always_true_solvent: Property violation"],
        hex::encode_prefixed([0u8; 32])
    );
    assert_eq!(vault_results["covered"], "2/4, 50%");
    assert!(
        session.backend().state().load(deployed_address(0), U256::ZERO) >= U256::from(CAP)
    );

    let deposit = session.stats().get("Vault", "deposit").unwrap();
    assert!(deposit.total > 0);
    assert_eq!(deposit.failed, 0);
    // the fallback and the one wei withdrawal revert
    assert!(report.statistics["Vault"]["fallback"].starts_with("Failed: 1/1."));
    assert!(report.statistics["Vault"]["withdraw"].starts_with("Failed: 1/"));
}

#[test]
fn report_summarizes_the_session() {
    let vault = vault();
    let backend = vault_backend(&vault);
    let config = FuzzConfig { seed: Some(7), limit: 20, corner_cases: false, ..Default::default() };
    let session: FuzzSession<MockBackend> =
        session(project(&[vault], Default::default()), config, backend);

    let report = session.report(Default::default(), false);
    assert_eq!(report.transactions, 0);
    assert_eq!(report.coverage["Vault"].covered, 0);
    assert_eq!(report.coverage["Vault"].total, 4);
    assert_eq!(report.tx_rate(), 0.0);

    let json = report.to_json();
    assert_eq!(json["transactions"], 0);
    assert_eq!(json["coverage"]["Vault"], "0/4, 0%");
    assert_eq!(json["terminated"], false);
    assert!(json["corpus"]["address"].as_u64().unwrap() >= 3);
}

#[test]
fn runs_a_project_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let token = TestContract::new(
        "Token",
        &[
            "function transfer(address to, uint256 amount) returns (bool)",
            "function renounceOwnership()",
            "function fuzz_always_true_supply() view returns (bool)",
        ],
    );

    let artifacts = root.join("build/contracts");
    std::fs::create_dir_all(&artifacts).unwrap();
    let artifact = serde_json::json!({
        "contractName": "Token",
        "abi": token.abi,
        "deployedBytecode": hex::encode_prefixed(runtime_code(1)),
        "ast": { "nodes": [{ "contractKind": "contract", "name": "Token" }] },
    });
    std::fs::write(artifacts.join("Token.json"), artifact.to_string()).unwrap();
    std::fs::write(
        root.join("accounts.json"),
        serde_json::json!({
            "accounts": [
                { "key": fixtures::ALICE_KEY, "amount": "100000000000000000000" },
                { "key": fixtures::BOB_KEY, "amount": "0x56bc75e2d63100000" },
            ]
        })
        .to_string(),
    )
    .unwrap();
    std::fs::write(
        root.join("transactions.log"),
        format!(
            "{{\"from\":\"{}\",\"to\":null,\"nonce\":0,\"value\":\"0x0\",\"gas\":6000000,\"gasPrice\":\"0x1\",\"input\":\"0x6080\"}}\n",
            fixtures::ALICE
        ),
    )
    .unwrap();
    std::fs::write(root.join("config.json"), r#"{"Token":{"ignore":["renounceOwnership"]}}"#)
        .unwrap();
    let metadata = root.join("metadata.json");
    std::fs::write(
        &metadata,
        r#"{"tuffleProjDir":".","transactions":"transactions.log","accounts":"accounts.json","config":"config.json"}"#,
    )
    .unwrap();

    let backend = backend(1).with_handler(deployed_address(0), |_, _| traces::returns_bool(true));
    let config = FuzzConfig { seed: Some(9), limit: 50, statistics: true, ..Default::default() };
    let report = run_campaign(&metadata, config, backend).unwrap();

    assert!(!report.terminated);
    assert!(report.transactions >= 50);
    assert!(report.results["Token"].contains_key("covered"));
    let methods: Vec<&String> = report.statistics["Token"].keys().collect();
    assert_eq!(methods, ["fallback", "fuzz_always_true_supply", "transfer"]);
}
