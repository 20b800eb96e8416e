//! Transactions sent by the fuzzer.

use crate::constants::DEFAULT_GAS_PRICE;
use alloy_consensus::{SignableTransaction, Signed};
use alloy_primitives::{Address, B256, Bytes, TxKind, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use std::ops::Deref;

pub use alloy_consensus::TxLegacy;

/// Constructors of the legacy transactions sent by the fuzzer.
pub trait FuzzTransaction: Sized {
    /// Creates a call to `to`.
    fn call(to: Address, nonce: u64, gas_limit: u64, value: U256, input: Bytes) -> Self;

    /// Creates a contract creation running `init_code`.
    fn create(nonce: u64, gas_limit: u64, value: U256, init_code: Bytes) -> Self;

    /// Signs the transaction with `signer`.
    fn sign(self, signer: &PrivateKeySigner) -> alloy_signer::Result<SignedTransaction>;
}

impl FuzzTransaction for TxLegacy {
    fn call(to: Address, nonce: u64, gas_limit: u64, value: U256, input: Bytes) -> Self {
        Self {
            nonce,
            gas_price: DEFAULT_GAS_PRICE,
            gas_limit,
            to: TxKind::Call(to),
            value,
            input,
            ..Default::default()
        }
    }

    fn create(nonce: u64, gas_limit: u64, value: U256, init_code: Bytes) -> Self {
        Self {
            nonce,
            gas_price: DEFAULT_GAS_PRICE,
            gas_limit,
            to: TxKind::Create,
            value,
            input: init_code,
            ..Default::default()
        }
    }

    fn sign(self, signer: &PrivateKeySigner) -> alloy_signer::Result<SignedTransaction> {
        let signature = signer.sign_hash_sync(&self.signature_hash())?;
        Ok(SignedTransaction { signed: self.into_signed(signature), from: signer.address() })
    }
}

/// A signed legacy transaction together with its sender.
#[derive(Clone, Debug)]
pub struct SignedTransaction {
    pub signed: Signed<TxLegacy>,
    pub from: Address,
}

impl SignedTransaction {
    /// Returns the callee, `None` for creations.
    pub fn to(&self) -> Option<Address> {
        self.signed.tx().to.to().copied()
    }

    /// Returns the hash of the signed transaction.
    pub fn hash(&self) -> B256 {
        *self.signed.hash()
    }
}

impl Deref for SignedTransaction {
    type Target = TxLegacy;

    fn deref(&self) -> &Self::Target {
        self.signed.tx()
    }
}
