use crate::helpers::*;
use alloy_primitives::U256;
use chainfuzz_config::FuzzConfig;
use chainfuzz_evm::{Finding, fuzz::Hint};
use chainfuzz_test_utils::{fixtures, init_tracing, traces};
use similar_asserts::assert_eq;
use std::ops::ControlFlow;

fn shop() -> TestContract {
    TestContract::new(
        "Shop",
        &[
            "function buy() payable",
            "function add(uint256 a, uint256 b) returns (uint256)",
            "function check()",
            "function fuzz_always_true_open() view returns (bool)",
        ],
    )
}

fn config() -> FuzzConfig {
    FuzzConfig { seed: Some(1), ..Default::default() }
}

fn values(amounts: &[u64]) -> Vec<U256> {
    amounts.iter().copied().map(U256::from).collect()
}

#[test]
fn halves_value_down_to_the_depth_cap() {
    init_tracing();
    let shop_address = deployed_address(0);
    let backend = backend(1).with_handler(shop_address, always_reverts);
    let config = FuzzConfig { retry_half_value: true, ..config() };
    let mut session = session(project(&[shop()], Default::default()), config, backend);

    let hint = Hint::call("Shop", "buy").with_amount(U256::from(8)).with_sender(fixtures::ALICE);
    assert_eq!(session.run_round(hint).unwrap(), ControlFlow::Continue(()));

    assert_eq!(values_sent_to(session.backend(), shop_address), values(&[8, 4, 2, 1, 0]));
    assert_eq!(session.tx_count(), 5);
    assert!(
        session.backend().applied.iter().skip(1).all(|(tx, _)| tx.from == fixtures::ALICE),
        "halving retries keep the sender"
    );
}

#[test]
fn both_policies_fan_out() {
    let shop_address = deployed_address(0);
    let backend = backend(1).with_handler(shop_address, always_reverts);
    let config = FuzzConfig {
        retry_half_value: true,
        retry_different_sender: true,
        max_retry_depth: 2,
        ..config()
    };
    let mut session = session(project(&[shop()], Default::default()), config, backend);

    let hint = Hint::call("Shop", "buy").with_amount(U256::from(8));
    session.run_round(hint).unwrap();

    assert_eq!(values_sent_to(session.backend(), shop_address), values(&[8, 4, 2, 4, 8, 4, 8]));
}

#[test]
fn successful_calls_are_not_retried() {
    let shop_address = deployed_address(0);
    let backend = backend(1);
    let config = FuzzConfig { retry_half_value: true, retry_different_sender: true, ..config() };
    let mut session = session(project(&[shop()], Default::default()), config, backend);

    session.run_round(Hint::call("Shop", "buy").with_amount(U256::from(8))).unwrap();
    assert_eq!(values_sent_to(session.backend(), shop_address), values(&[8]));
}

#[test]
fn rejected_transactions_count_and_retry() {
    let shop_address = deployed_address(0);
    let config = FuzzConfig { retry_half_value: true, statistics: true, ..config() };
    let mut session = session(project(&[shop()], Default::default()), config, backend(1));
    let amount = fixtures::INITIAL_BALANCE * U256::from(3);

    let hint = Hint::call("Shop", "buy").with_amount(amount).with_sender(fixtures::BOB);
    session.run_round(hint).unwrap();

    // 300 ether is rejected, 150 ether too, 75 ether is applied
    assert_eq!(session.tx_count(), 3);
    assert_eq!(values_sent_to(session.backend(), shop_address), vec![amount / U256::from(4)]);
    let stats = session.stats().get("Shop", "buy").unwrap();
    assert_eq!((stats.failed, stats.total), (2, 3));
}

#[test]
fn records_overflows_and_assertions() {
    let shop = shop();
    let (add, check) = (shop.selector("add"), shop.selector("check"));
    let backend = backend(1).with_handler(deployed_address(0), move |_, ctx| {
        match selector(ctx) {
            Some(s) if s == add => traces::overflowing_add(),
            Some(s) if s == check => traces::assertion_failure(),
            _ => traces::stop(),
        }
    });
    let mut session = session(project(&[shop], Default::default()), config(), backend);

    session.run_round(Hint::call("Shop", "add")).unwrap();
    session.run_round(Hint::call("Shop", "check")).unwrap();

    let results = session.results();
    let overflow = results.get("Shop", "add", &Finding::Overflow).unwrap();
    assert!(overflow.starts_with(&format!("({} ADD", U256::from(1) << 255)), "{overflow}");
    assert_eq!(results.get("Shop", "check", &Finding::AssertionFailure), Some(""));
    assert_eq!(session.stats().since_reset(), 2);
}

#[test]
fn reverted_property_ends_the_session() {
    let backend = backend(1).with_handler(deployed_address(0), always_reverts);
    let mut session = session(project(&[shop()], Default::default()), config(), backend);

    let flow = session.run_round(Hint::call("Shop", "fuzz_always_true_open")).unwrap();
    assert_eq!(flow, ControlFlow::Break(()));
    assert_eq!(
        session.results().get("Shop", "fuzz_always_true_open", &Finding::RevertInProbe),
        Some("")
    );
}

#[test]
fn property_returning_true_is_fine() {
    let backend =
        backend(1).with_handler(deployed_address(0), |_, _| traces::returns_bool(true));
    let mut session = session(project(&[shop()], Default::default()), config(), backend);

    let flow = session.run_round(Hint::call("Shop", "fuzz_always_true_open")).unwrap();
    assert_eq!(flow, ControlFlow::Continue(()));
    assert!(session.results()["Shop"].is_empty());
}

#[test]
fn property_returning_false_ends_the_session() {
    let backend =
        backend(1).with_handler(deployed_address(0), |_, _| traces::returns_bool(false));
    let mut session = session(project(&[shop()], Default::default()), config(), backend);

    let flow = session.run_round(Hint::call("Shop", "fuzz_always_true_open")).unwrap();
    assert_eq!(flow, ControlFlow::Break(()));
    assert_eq!(
        session.results().get("Shop", "fuzz_always_true_open", &Finding::PropertyViolation),
        Some(format!("0x{}", "00".repeat(32)).as_str())
    );
}

#[test]
fn property_output_that_is_not_a_word_is_not_a_violation() {
    let mut calls = 0;
    let backend = backend(1).with_handler(deployed_address(0), move |_, _| {
        calls += 1;
        // an empty output, then a truncated one
        if calls == 1 { traces::stop() } else { traces::returns(vec![0u8, 0, 1]) }
    });
    let config = FuzzConfig { statistics: true, ..config() };
    let mut session = session(project(&[shop()], Default::default()), config, backend);

    for _ in 0..2 {
        let flow = session.run_round(Hint::call("Shop", "fuzz_always_true_open")).unwrap();
        assert_eq!(flow, ControlFlow::Continue(()));
    }
    assert!(session.results()["Shop"].is_empty());
    let stats = session.stats().get("Shop", "fuzz_always_true_open").unwrap();
    assert_eq!((stats.failed, stats.total), (0, 2));
}
