//! Funded accounts used to send transactions.

use crate::{errors::ProjectError, fs, serde_helpers::from_int_or_hex};
use alloy_primitives::{Address, U256, map::AddressHashMap};
use alloy_signer_local::PrivateKeySigner;
use rand::{Rng, seq::IndexedRandom};
use serde::Deserialize;
use std::path::Path;

/// An account with its signer and initial balance.
#[derive(Clone, Debug)]
pub struct Account {
    pub address: Address,
    /// Balance the account is funded with when a session starts.
    pub balance: U256,
    pub signer: PrivateKeySigner,
}

impl Account {
    /// Creates an account from a hex encoded private key.
    pub fn from_key(key: &str, balance: U256) -> Result<Self, ProjectError> {
        let signer: PrivateKeySigner =
            key.parse().map_err(|source| ProjectError::PrivateKey { index: 0, source })?;
        Ok(Self { address: signer.address(), balance, signer })
    }
}

/// The accounts of a project, in file order.
#[derive(Clone, Debug, Default)]
pub struct Accounts {
    accounts: Vec<Account>,
    by_address: AddressHashMap<usize>,
}

#[derive(Deserialize)]
struct AccountsJson {
    accounts: Vec<AccountJson>,
}

#[derive(Deserialize)]
struct AccountJson {
    key: String,
    #[serde(deserialize_with = "from_int_or_hex")]
    amount: U256,
}

impl Accounts {
    /// Reads the accounts file at `path`.
    ///
    /// ```json
    /// { "accounts": [{ "key": "0xac09…ff80", "amount": "100000000000000000000" }] }
    /// ```
    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let json: AccountsJson = fs::read_json_file(path)?;
        let keys = json.accounts.into_iter().map(|account| (account.key, account.amount));
        let accounts = Self::from_keys(keys)?;
        debug!(target: "accounts", ?path, count = accounts.len(), "loaded accounts");
        Ok(accounts)
    }

    /// Creates the accounts from `(private key, balance)` pairs.
    pub fn from_keys<K: AsRef<str>>(
        keys: impl IntoIterator<Item = (K, U256)>,
    ) -> Result<Self, ProjectError> {
        let mut accounts = Self::default();
        for (index, (key, balance)) in keys.into_iter().enumerate() {
            let account = Account::from_key(key.as_ref(), balance).map_err(|err| match err {
                ProjectError::PrivateKey { source, .. } => {
                    ProjectError::PrivateKey { index, source }
                }
                err => err,
            })?;
            accounts.by_address.insert(account.address, accounts.accounts.len());
            accounts.accounts.push(account);
        }
        if accounts.is_empty() {
            return Err(ProjectError::NoAccounts);
        }
        Ok(accounts)
    }

    /// Returns the account with the given address.
    pub fn get(&self, address: &Address) -> Result<&Account, ProjectError> {
        self.by_address
            .get(address)
            .map(|index| &self.accounts[*index])
            .ok_or(ProjectError::UnknownAccount(*address))
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.by_address.contains_key(address)
    }

    /// Picks an account uniformly at random.
    ///
    /// Returns `None` if there are no accounts.
    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Account> {
        self.accounts.choose(rng)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
