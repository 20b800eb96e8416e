//! Turning partially specified intents into signed transactions.

use crate::{
    FuzzError,
    contracts::{DeployedContracts, FALLBACK},
    corpus::ValueCorpus,
    kind::FuzzKind,
};
use alloy_dyn_abi::{DynSolValue, JsonAbiExt, Specifier};
use alloy_json_abi::{Function, StateMutability};
use alloy_primitives::{Address, Bytes, U256};
use chainfuzz_common::{Accounts, ProjectError};
use chainfuzz_config::FuzzConfig;
use chainfuzz_evm_core::{ExecutionBackend, FuzzTransaction, SignedTransaction, TxLegacy};
use rand::Rng;

/// A partially specified transaction. Unset fields are sampled.
///
/// [`TxGenerator::generate`] writes the contract, method and amount it used back into the hint.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Hint {
    pub contract: Option<String>,
    pub method: Option<String>,
    pub args: Option<Vec<DynSolValue>>,
    pub amount: Option<U256>,
    pub sender: Option<Address>,
    /// Call the fallback function with empty calldata.
    pub fallback: bool,
}

impl Hint {
    /// A call to the fallback function of `contract`.
    pub fn fallback(contract: impl Into<String>) -> Self {
        Self { contract: Some(contract.into()), fallback: true, ..Default::default() }
    }

    /// A call to `method` of `contract`.
    pub fn call(contract: impl Into<String>, method: impl Into<String>) -> Self {
        Self { contract: Some(contract.into()), method: Some(method.into()), ..Default::default() }
    }

    pub fn with_amount(mut self, amount: U256) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_sender(mut self, sender: Address) -> Self {
        self.sender = Some(sender);
        self
    }
}

/// What was sent by the last generated transaction.
#[derive(Clone, Debug, PartialEq)]
pub struct TxDescriptor {
    pub contract: String,
    pub method: String,
    /// Whether the method is declared `view` or `pure`.
    pub constant: bool,
    pub value: U256,
    pub args: Vec<DynSolValue>,
    pub sender: Address,
    pub to: Address,
    /// ABI of the called method, used to decode its output. `None` for the fallback.
    pub function: Option<Function>,
}

/// Generates transactions from hints, drawing the unspecified parts from the corpus.
pub struct TxGenerator<'a, R: ?Sized> {
    pub contracts: &'a DeployedContracts,
    pub accounts: &'a Accounts,
    pub corpus: &'a mut ValueCorpus,
    pub config: &'a FuzzConfig,
    pub rng: &'a mut R,
}

impl<R: Rng + ?Sized> TxGenerator<'_, R> {
    /// Builds and signs the transaction described by `hint`.
    pub fn generate<B: ExecutionBackend>(
        &mut self,
        backend: &B,
        hint: &mut Hint,
    ) -> Result<(SignedTransaction, TxDescriptor), FuzzError> {
        let contract = match &hint.contract {
            Some(contract) => contract.clone(),
            None => self
                .contracts
                .random_contract(self.rng)
                .ok_or(FuzzError::NoFuzzableContracts)?
                .to_string(),
        };

        let method = if hint.fallback {
            FALLBACK.to_string()
        } else {
            match &hint.method {
                Some(method) => method.clone(),
                None => self
                    .contracts
                    .random_method(&contract, self.rng)
                    .unwrap_or(FALLBACK)
                    .to_string(),
            }
        };

        let to = self.contracts.address(&contract)?;
        let function = self.contracts.function(&contract, &method)?.cloned();

        let args = match (&hint.args, &function) {
            (Some(args), _) => args.clone(),
            (None, Some(function)) => self.sample_args(function)?,
            (None, None) => Vec::new(),
        };

        let input: Bytes = match &function {
            Some(function) => function
                .abi_encode_input(&args)
                .map_err(|source| FuzzError::Encode { method: method.clone(), source })?
                .into(),
            None => Bytes::new(),
        };

        let account = match hint.sender {
            Some(sender) => self.accounts.get(&sender)?,
            None => self.accounts.random(self.rng).ok_or(ProjectError::NoAccounts)?,
        };

        let value = match hint.amount {
            Some(amount) => amount,
            None if self.contracts.is_payable(&contract, &method) => {
                self.sample_payable_amount(backend.balance(account.address))
            }
            None => U256::ZERO,
        };

        hint.contract = Some(contract.clone());
        hint.method = Some(method.clone());
        hint.amount = Some(value);

        let nonce = backend.nonce(account.address);
        let tx = TxLegacy::call(to, nonce, self.config.gas_limit, value, input)
            .sign(&account.signer)?;

        let descriptor = TxDescriptor {
            constant: function.as_ref().is_some_and(|f| {
                matches!(f.state_mutability, StateMutability::View | StateMutability::Pure)
            }),
            contract,
            method,
            value,
            args,
            sender: account.address,
            to,
            function,
        };
        debug!(
            target: "generator",
            contract = %descriptor.contract,
            method = %descriptor.method,
            sender = %descriptor.sender,
            %value,
            nonce,
            "generated transaction"
        );
        Ok((tx, descriptor))
    }

    fn sample_args(&mut self, function: &Function) -> Result<Vec<DynSolValue>, FuzzError> {
        let max_len = self.config.corpus.max_sequence_len;
        function
            .inputs
            .iter()
            .map(|param| {
                let ty = param
                    .resolve()
                    .map_err(|_| FuzzError::UnsupportedType(param.selector_type().into_owned()))?;
                let kind = FuzzKind::try_from(&ty)?;
                Ok(kind.sample(self.corpus, self.rng, max_len))
            })
            .collect()
    }

    /// Draws an amount strictly below `balance` from the big integer pool.
    ///
    /// Falls back to zero when no affordable amount is found within the configured number of
    /// draws.
    fn sample_payable_amount(&mut self, balance: U256) -> U256 {
        for _ in 0..self.config.corpus.payable_sample_attempts {
            let amount = self.corpus.big_ints.next_value();
            if amount < balance {
                return amount;
            }
        }
        trace!(target: "generator", %balance, "no affordable amount found, sending zero");
        U256::ZERO
    }
}
