use crate::traces;
use alloy_primitives::{Address, U256, map::AddressHashMap};
use chainfuzz_evm_core::{
    BackendError, BlockEnv, Execution, ExecutionBackend, SignedTransaction,
};
use std::collections::BTreeMap;

/// World state of a [`MockBackend`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MockState {
    pub balances: AddressHashMap<U256>,
    pub nonces: AddressHashMap<u64>,
    /// Storage of the mocked contracts, free for handlers to use.
    pub storage: BTreeMap<(Address, U256), U256>,
}

impl MockState {
    pub fn load(&self, address: Address, slot: U256) -> U256 {
        self.storage.get(&(address, slot)).copied().unwrap_or_default()
    }

    pub fn store(&mut self, address: Address, slot: U256, value: U256) {
        self.storage.insert((address, slot), value);
    }

    fn transfer(&mut self, from: Address, to: Address, value: U256) {
        *self.balances.entry(from).or_default() -= value;
        *self.balances.entry(to).or_default() += value;
    }
}

/// What a handler sees of the transaction it executes.
#[derive(Debug)]
pub struct CallContext<'a> {
    pub from: Address,
    /// `None` for creations.
    pub to: Option<Address>,
    pub value: U256,
    pub input: &'a [u8],
    pub nonce: u64,
    pub env: &'a BlockEnv,
}

/// Mocked contract code: produces the execution of a transaction.
pub type Handler = Box<dyn FnMut(&mut MockState, &CallContext<'_>) -> Execution>;

/// An in-memory backend whose contracts are closures.
///
/// Calls to addresses without a handler succeed without output. Value is only transferred by
/// successful transactions, and transactions sending more than the sender owns are rejected.
#[derive(Default)]
pub struct MockBackend {
    state: MockState,
    handlers: AddressHashMap<Handler>,
    deployer: Option<Handler>,
    /// Every applied transaction with the block it was applied in.
    pub applied: Vec<(SignedTransaction, BlockEnv)>,
    /// Number of times a snapshot was restored.
    pub restores: usize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `handler` as the code of `address`.
    pub fn with_handler(
        mut self,
        address: Address,
        handler: impl FnMut(&mut MockState, &CallContext<'_>) -> Execution + 'static,
    ) -> Self {
        self.handlers.insert(address, Box::new(handler));
        self
    }

    /// Installs `handler` as the executor of contract creations.
    pub fn with_deployer(
        mut self,
        handler: impl FnMut(&mut MockState, &CallContext<'_>) -> Execution + 'static,
    ) -> Self {
        self.deployer = Some(Box::new(handler));
        self
    }

    pub fn state(&self) -> &MockState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut MockState {
        &mut self.state
    }

    /// Block timestamps of the applied transactions, in order.
    pub fn timestamps(&self) -> Vec<u64> {
        self.applied.iter().map(|(_, env)| env.timestamp).collect()
    }
}

impl ExecutionBackend for MockBackend {
    type Snapshot = MockState;

    fn apply_transaction(
        &mut self,
        tx: &SignedTransaction,
        env: &BlockEnv,
    ) -> Result<Execution, BackendError> {
        let from = tx.from;
        let value = tx.value;
        let balance = self.balance(from);
        if value > balance {
            return Err(BackendError::rejected(format!(
                "insufficient funds for transfer: have {balance}, want {value}"
            )));
        }

        let nonce = self.nonce(from);
        *self.state.nonces.entry(from).or_default() += 1;

        let context = CallContext { from, to: tx.to(), value, input: &tx.input, nonce, env };
        let handler = match context.to {
            Some(to) => self.handlers.get_mut(&to),
            None => self.deployer.as_mut(),
        };
        let mut execution = match handler {
            Some(handler) => handler(&mut self.state, &context),
            None => traces::stop(),
        };

        let recipient = match context.to {
            Some(to) => to,
            None => {
                let created = from.create(nonce);
                if execution.receipt.status {
                    execution.receipt.contract_address = Some(created);
                }
                created
            }
        };
        if execution.receipt.status && !value.is_zero() {
            self.state.transfer(from, recipient, value);
        }

        trace!(
            target: "mock",
            %from,
            to = ?context.to,
            %value,
            status = execution.receipt.status,
            "applied transaction"
        );
        self.applied.push((tx.clone(), env.clone()));
        Ok(execution)
    }

    fn snapshot(&self) -> Self::Snapshot {
        self.state.clone()
    }

    fn restore(&mut self, snapshot: &Self::Snapshot) {
        self.state = snapshot.clone();
        self.restores += 1;
    }

    fn balance(&self, address: Address) -> U256 {
        self.state.balances.get(&address).copied().unwrap_or_default()
    }

    fn nonce(&self, address: Address) -> u64 {
        self.state.nonces.get(&address).copied().unwrap_or_default()
    }

    fn set_balance(&mut self, address: Address, balance: U256) {
        self.state.balances.insert(address, balance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use alloy_primitives::Bytes;
    use chainfuzz_evm_core::{FuzzTransaction, TxLegacy};

    fn send(backend: &mut MockBackend, to: Address, value: u64) -> Result<Execution, BackendError> {
        let alice = fixtures::alice();
        let tx = TxLegacy::call(
            to,
            backend.nonce(alice.address),
            100_000,
            U256::from(value),
            Bytes::new(),
        )
        .sign(&alice.signer)
        .unwrap();
        backend.apply_transaction(&tx, &BlockEnv::default())
    }

    #[test]
    fn transfers_value_of_successful_calls() {
        let target = Address::with_last_byte(1);
        let reverting = Address::with_last_byte(2);
        let mut backend = MockBackend::new().with_handler(reverting, |_, _| traces::revert());
        backend.set_balance(fixtures::ALICE, U256::from(10));

        send(&mut backend, target, 4).unwrap();
        let execution = send(&mut backend, reverting, 4).unwrap();
        assert!(!execution.receipt.status);

        assert_eq!(backend.balance(fixtures::ALICE), U256::from(6));
        assert_eq!(backend.balance(target), U256::from(4));
        assert_eq!(backend.nonce(fixtures::ALICE), 2);
    }

    #[test]
    fn rejects_unaffordable_value() {
        let mut backend = MockBackend::new();
        backend.set_balance(fixtures::ALICE, U256::from(1));
        let err = send(&mut backend, Address::with_last_byte(1), 2).unwrap_err();
        assert!(matches!(err, BackendError::Rejected { .. }));
        assert_eq!(backend.nonce(fixtures::ALICE), 0);
    }

    #[test]
    fn restores_snapshots() {
        let mut backend = MockBackend::new();
        backend.set_balance(fixtures::ALICE, U256::from(10));
        let snapshot = backend.snapshot();
        send(&mut backend, Address::with_last_byte(1), 3).unwrap();
        backend.restore(&snapshot);
        assert_eq!(backend.balance(fixtures::ALICE), U256::from(10));
        assert_eq!(backend.nonce(fixtures::ALICE), 0);
        assert_eq!(backend.restores, 1);
    }
}
