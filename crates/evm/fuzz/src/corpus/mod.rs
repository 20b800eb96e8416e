//! The value corpus: typed pools of interesting values that fuzzed arguments are drawn from.

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, B256, U256};
use chainfuzz_common::Accounts;
use chainfuzz_config::CorpusConfig;
use rand::Rng;
use serde::Serialize;

mod pool;
pub use pool::ValuePool;

mod timestamp;
pub use timestamp::TimestampPool;

/// Pools of values seen so far in a session.
///
/// Integer pools of up to 64 bits store the two's complement bit pattern, so a single pool serves
/// both the signed and the unsigned type of that width.
#[derive(Clone, Debug)]
pub struct ValueCorpus {
    pub int8: ValuePool<u8>,
    pub int16: ValuePool<u16>,
    pub int32: ValuePool<u32>,
    pub int64: ValuePool<u64>,
    pub words: ValuePool<B256>,
    pub addresses: ValuePool<Address>,
    /// Integers wider than 64 bits, signed ones in 256 bit two's complement.
    pub big_ints: ValuePool<U256>,
    pub strings: ValuePool<String>,
    pub timestamps: TimestampPool,
}

impl Default for ValueCorpus {
    fn default() -> Self {
        Self {
            int8: ValuePool::new("int8"),
            int16: ValuePool::new("int16"),
            int32: ValuePool::new("int32"),
            int64: ValuePool::new("int64"),
            words: ValuePool::new("bytes32"),
            addresses: ValuePool::new("address"),
            big_ints: ValuePool::new("bigInt"),
            strings: ValuePool::new("string"),
            timestamps: TimestampPool::default(),
        }
    }
}

/// Number of values in each pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CorpusSizes {
    pub int8: usize,
    pub int16: usize,
    pub int32: usize,
    pub int64: usize,
    pub bytes32: usize,
    pub address: usize,
    pub big_int: usize,
    pub string: usize,
    pub timestamp: usize,
}

/// Largest power of two seeded into the big integer pool is below this bound.
const BIG_INT_SEED_BOUND: u64 = 1_000_000_000_000_000_000;

impl ValueCorpus {
    /// Seeds the pools with boundary values, random words and the accounts.
    pub fn seed<R: Rng + ?Sized>(
        &mut self,
        config: &CorpusConfig,
        accounts: &Accounts,
        rng: &mut R,
    ) {
        self.big_ints.add(U256::ZERO);
        // -1
        self.int64.add(u64::MAX);
        self.int32.add(u32::MAX);
        self.int16.add(u16::MAX);

        let mut power = 1u64;
        while power < BIG_INT_SEED_BOUND {
            if power <= i32::MAX as u64 {
                self.int32.add(power as u32);
            }
            if power <= i16::MAX as u64 {
                self.int16.add(power as u16);
            }
            self.big_ints.add(U256::from(power));
            self.int64.add(power);
            power <<= 1;
        }

        for _ in 0..config.random_words {
            self.words.add(B256::from(rng.random::<[u8; 32]>()));
        }
        self.words.add(B256::ZERO);

        self.strings.add(config.marker_string.clone());

        for byte in 0..=u8::MAX {
            self.int8.add(byte);
            self.int16.add(byte.into());
            self.int32.add(byte.into());
            self.int64.add(byte.into());
        }

        for account in accounts.iter() {
            self.addresses.add(account.address);
            self.big_ints.add(account.balance);
        }

        debug!(target: "corpus", sizes = ?self.sizes(), "seeded corpus");
    }

    /// Feeds every scalar leaf of `value` into the matching pool.
    ///
    /// Booleans, 8 bit integers and byte strings are ignored.
    pub fn insert_value(&mut self, value: &DynSolValue) {
        match value {
            DynSolValue::Int(int, bits) => self.insert_int(int.into_raw(), *bits),
            DynSolValue::Uint(uint, bits) => self.insert_int(*uint, *bits),
            DynSolValue::FixedBytes(word, 32) => {
                self.words.add(*word);
            }
            DynSolValue::Address(address) => {
                self.addresses.add(*address);
            }
            DynSolValue::String(s) => {
                self.strings.add(s.clone());
            }
            DynSolValue::Array(values)
            | DynSolValue::FixedArray(values)
            | DynSolValue::Tuple(values) => {
                for value in values {
                    self.insert_value(value);
                }
            }
            _ => {}
        }
    }

    fn insert_int(&mut self, raw: U256, bits: usize) {
        let low = raw.as_limbs()[0];
        match bits {
            8 => {}
            16 => {
                self.int16.add(low as u16);
            }
            32 => {
                self.int32.add(low as u32);
            }
            64 => {
                self.int64.add(low);
            }
            _ => {
                self.big_ints.add(raw);
            }
        }
    }

    /// Returns the number of values in each pool.
    pub fn sizes(&self) -> CorpusSizes {
        CorpusSizes {
            int8: self.int8.len(),
            int16: self.int16.len(),
            int32: self.int32.len(),
            int64: self.int64.len(),
            bytes32: self.words.len(),
            address: self.addresses.len(),
            big_int: self.big_ints.len(),
            string: self.strings.len(),
            timestamp: self.timestamps.len(),
        }
    }
}
