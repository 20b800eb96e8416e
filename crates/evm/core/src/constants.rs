use alloy_primitives::{B256, b256};

/// Gas limit of the blocks transactions are executed in.
pub const DEFAULT_BLOCK_GAS_LIMIT: u64 = 30_000_000;

/// Gas price of the generated transactions.
pub const DEFAULT_GAS_PRICE: u128 = 1;

/// The ABI encoding of `true`, expected from every invariant probe.
pub const TRUE_WORD: B256 =
    b256!("0x0000000000000000000000000000000000000000000000000000000000000001");
