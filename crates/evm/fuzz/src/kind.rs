//! The closed set of parameter kinds the generator knows how to fill.

use crate::{FuzzError, corpus::ValueCorpus};
use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::{I256, U256};
use rand::Rng;

/// The kind of a fuzzed parameter, which determines the pool its values are drawn from.
///
/// Integers of exactly 8, 16, 32 or 64 bits use the pool of that width, every other width
/// uses the big integer pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FuzzKind {
    Int8 { signed: bool },
    Int16 { signed: bool },
    Int32 { signed: bool },
    Int64 { signed: bool },
    BigInt { bits: usize, signed: bool },
    /// `bytesN`, drawn from the word pool and truncated to `N` bytes.
    Word(usize),
    Address,
    String,
    Bool,
    /// Dynamic `bytes`, drawn byte by byte from the 8 bit pool.
    Bytes,
    Sequence(Box<FuzzKind>),
    FixedArray(Box<FuzzKind>, usize),
    Tuple(Vec<FuzzKind>),
}

impl FuzzKind {
    fn int(bits: usize, signed: bool) -> Self {
        match bits {
            8 => Self::Int8 { signed },
            16 => Self::Int16 { signed },
            32 => Self::Int32 { signed },
            64 => Self::Int64 { signed },
            bits => Self::BigInt { bits, signed },
        }
    }

    /// Draws a value of this kind from `corpus`.
    ///
    /// Dynamic sequences and byte strings get a length between 1 and `max_len`.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        corpus: &mut ValueCorpus,
        rng: &mut R,
        max_len: usize,
    ) -> DynSolValue {
        match self {
            Self::Int8 { signed } => int_value(U256::from(corpus.int8.next_value()), 8, *signed),
            Self::Int16 { signed } => int_value(U256::from(corpus.int16.next_value()), 16, *signed),
            Self::Int32 { signed } => int_value(U256::from(corpus.int32.next_value()), 32, *signed),
            Self::Int64 { signed } => int_value(U256::from(corpus.int64.next_value()), 64, *signed),
            Self::BigInt { bits, signed } => {
                int_value(corpus.big_ints.next_value(), *bits, *signed)
            }
            Self::Word(size) => {
                let mut word = corpus.words.next_value();
                word[(*size).min(32)..].fill(0);
                DynSolValue::FixedBytes(word, *size)
            }
            Self::Address => DynSolValue::Address(corpus.addresses.next_value()),
            Self::String => DynSolValue::String(corpus.strings.next_value()),
            Self::Bool => DynSolValue::Bool(rng.random()),
            Self::Bytes => {
                let len = sample_len(rng, max_len);
                DynSolValue::Bytes((0..len).map(|_| corpus.int8.next_value()).collect())
            }
            Self::Sequence(inner) => {
                let len = sample_len(rng, max_len);
                DynSolValue::Array((0..len).map(|_| inner.sample(corpus, rng, max_len)).collect())
            }
            Self::FixedArray(inner, len) => DynSolValue::FixedArray(
                (0..*len).map(|_| inner.sample(corpus, rng, max_len)).collect(),
            ),
            Self::Tuple(kinds) => DynSolValue::Tuple(
                kinds.iter().map(|kind| kind.sample(corpus, rng, max_len)).collect(),
            ),
        }
    }
}

impl TryFrom<&DynSolType> for FuzzKind {
    type Error = FuzzError;

    fn try_from(ty: &DynSolType) -> Result<Self, Self::Error> {
        Ok(match ty {
            DynSolType::Bool => Self::Bool,
            DynSolType::Int(bits) => Self::int(*bits, true),
            DynSolType::Uint(bits) => Self::int(*bits, false),
            DynSolType::FixedBytes(size) => Self::Word(*size),
            DynSolType::Address => Self::Address,
            DynSolType::Bytes => Self::Bytes,
            DynSolType::String => Self::String,
            DynSolType::Array(inner) => Self::Sequence(Box::new(Self::try_from(inner.as_ref())?)),
            DynSolType::FixedArray(inner, len) => {
                Self::FixedArray(Box::new(Self::try_from(inner.as_ref())?), *len)
            }
            DynSolType::Tuple(types) => {
                Self::Tuple(types.iter().map(Self::try_from).collect::<Result<_, _>>()?)
            }
            _ => return Err(FuzzError::UnsupportedType(ty.to_string())),
        })
    }
}

fn sample_len<R: Rng + ?Sized>(rng: &mut R, max_len: usize) -> usize {
    rng.random_range(1..=max_len.max(1))
}

/// Interprets the low `bits` bits of `raw` as an integer of that width.
fn int_value(raw: U256, bits: usize, signed: bool) -> DynSolValue {
    let mask = if bits >= 256 { U256::MAX } else { (U256::from(1) << bits) - U256::from(1) };
    let mut value = raw & mask;
    if !signed {
        return DynSolValue::Uint(value, bits);
    }
    if bits < 256 && value.bit(bits - 1) {
        // sign extend
        value |= !mask;
    }
    DynSolValue::Int(I256::from_raw(value), bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, B256};
    use rand::{SeedableRng, rngs::StdRng};

    fn kind(ty: &str) -> FuzzKind {
        FuzzKind::try_from(&ty.parse::<DynSolType>().unwrap()).unwrap()
    }

    #[test]
    fn maps_types_to_pools() {
        assert_eq!(kind("uint8"), FuzzKind::Int8 { signed: false });
        assert_eq!(kind("int64"), FuzzKind::Int64 { signed: true });
        assert_eq!(kind("uint24"), FuzzKind::BigInt { bits: 24, signed: false });
        assert_eq!(kind("bytes4"), FuzzKind::Word(4));
        assert_eq!(
            kind("(address,bool[])[2]"),
            FuzzKind::FixedArray(
                Box::new(FuzzKind::Tuple(vec![
                    FuzzKind::Address,
                    FuzzKind::Sequence(Box::new(FuzzKind::Bool)),
                ])),
                2
            )
        );
        assert!(matches!(
            FuzzKind::try_from(&DynSolType::Function),
            Err(FuzzError::UnsupportedType(_))
        ));
    }

    #[test]
    fn reinterprets_bit_patterns() {
        assert_eq!(int_value(U256::from(0xffu8), 8, true), DynSolValue::Int(I256::MINUS_ONE, 8));
        assert_eq!(int_value(U256::from(0xffu8), 8, false), DynSolValue::Uint(U256::from(255), 8));
        assert_eq!(
            int_value(U256::from(0x1_0005u32), 16, false),
            DynSolValue::Uint(U256::from(5), 16)
        );
        assert_eq!(int_value(U256::MAX, 256, false), DynSolValue::Uint(U256::MAX, 256));
        assert_eq!(int_value(U256::MAX, 256, true), DynSolValue::Int(I256::MINUS_ONE, 256));
        assert_eq!(
            int_value(U256::from(1) << 23, 24, true),
            DynSolValue::Int(I256::from_raw(U256::MAX << 23), 24)
        );
    }

    #[test]
    fn samples_round_robin_from_pools() {
        let mut corpus = ValueCorpus::default();
        let mut rng = StdRng::seed_from_u64(1);
        corpus.int16.add(1);
        corpus.int16.add(2);
        corpus.addresses.add(Address::with_last_byte(9));
        corpus.words.add(B256::repeat_byte(0xab));

        let uint16 = kind("uint16");
        assert_eq!(uint16.sample(&mut corpus, &mut rng, 16), DynSolValue::Uint(U256::from(1), 16));
        assert_eq!(uint16.sample(&mut corpus, &mut rng, 16), DynSolValue::Uint(U256::from(2), 16));
        assert_eq!(
            kind("address").sample(&mut corpus, &mut rng, 16),
            DynSolValue::Address(Address::with_last_byte(9))
        );

        let DynSolValue::FixedBytes(word, 2) = kind("bytes2").sample(&mut corpus, &mut rng, 16)
        else {
            panic!("expected bytes2")
        };
        assert_eq!(&word[..3], &[0xab, 0xab, 0x00]);
    }

    #[test]
    fn sequence_lengths_are_bounded() {
        let mut corpus = ValueCorpus::default();
        let mut rng = StdRng::seed_from_u64(2);
        let kinds = [kind("uint256[]"), kind("bytes")];
        for _ in 0..100 {
            for kind in &kinds {
                let len = match kind.sample(&mut corpus, &mut rng, 4) {
                    DynSolValue::Array(values) => values.len(),
                    DynSolValue::Bytes(bytes) => bytes.len(),
                    other => panic!("unexpected {other:?}"),
                };
                assert!((1..=4).contains(&len), "{len}");
            }
        }
    }
}
