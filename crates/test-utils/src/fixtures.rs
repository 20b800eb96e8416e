//! Well known development accounts.

use alloy_primitives::{Address, U256, address};
use chainfuzz_common::{Account, Accounts};

pub const ALICE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const ALICE: Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

pub const BOB_KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
pub const BOB: Address = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");

/// 100 ether.
pub const INITIAL_BALANCE: U256 = U256::from_limbs([7_766_279_631_452_241_920, 5, 0, 0]);

pub fn alice() -> Account {
    Account::from_key(ALICE_KEY, INITIAL_BALANCE).expect("valid key")
}

pub fn bob() -> Account {
    Account::from_key(BOB_KEY, INITIAL_BALANCE).expect("valid key")
}

/// Alice and Bob, both funded with [`INITIAL_BALANCE`].
pub fn accounts() -> Accounts {
    Accounts::from_keys([(ALICE_KEY, INITIAL_BALANCE), (BOB_KEY, INITIAL_BALANCE)])
        .expect("valid keys")
}
