//! # chainfuzz-evm-coverage
//!
//! Program counter coverage of the contracts exercised by a fuzzing session.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

use alloy_primitives::{Address, map::AddressHashMap};
use chainfuzz_evm_core::bytecode::instruction_offsets;
use std::{
    collections::BTreeSet,
    fmt,
    ops::{AddAssign, Deref, DerefMut},
};

mod collector;
pub use collector::CoverageCollector;

/// Program counters executed under each address.
///
/// The map only ever grows during a session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoverageMap(pub AddressHashMap<BTreeSet<usize>>);

impl CoverageMap {
    /// Records that `pc` was executed under `address`.
    #[inline]
    pub fn hit(&mut self, address: Address, pc: usize) {
        self.0.entry(address).or_default().insert(pc);
    }

    /// Returns the coverage of `code` deployed at `addresses`.
    ///
    /// Only program counters that start an instruction of `code` are counted.
    pub fn summary<'a>(
        &self,
        addresses: impl IntoIterator<Item = &'a Address>,
        code: &[u8],
    ) -> CoverageSummary {
        let hits: BTreeSet<usize> = addresses
            .into_iter()
            .filter_map(|address| self.0.get(address))
            .flatten()
            .copied()
            .collect();
        let mut summary = CoverageSummary::default();
        for pc in instruction_offsets(code) {
            summary.total += 1;
            if hits.contains(&pc) {
                summary.covered += 1;
            }
        }
        summary
    }
}

impl Deref for CoverageMap {
    type Target = AddressHashMap<BTreeSet<usize>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for CoverageMap {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// Number of instructions of a contract that were executed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CoverageSummary {
    pub covered: usize,
    pub total: usize,
}

impl CoverageSummary {
    /// Covered share in whole percent.
    pub fn percentage(&self) -> usize {
        if self.total == 0 { 0 } else { 100 * self.covered / self.total }
    }
}

impl AddAssign<&Self> for CoverageSummary {
    fn add_assign(&mut self, other: &Self) {
        self.covered += other.covered;
        self.total += other.total;
    }
}

impl fmt::Display for CoverageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}, {}%", self.covered, self.total, self.percentage())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainfuzz_evm_core::opcode as op;

    #[test]
    fn summarizes_instruction_hits() {
        // PUSH1 0x01, PUSH1 0x02, ADD, STOP
        let code = [op::PUSH1, 0x01, op::PUSH1, 0x02, op::ADD, op::STOP];
        let a = Address::with_last_byte(1);
        let b = Address::with_last_byte(2);

        let mut map = CoverageMap::default();
        map.hit(a, 0);
        map.hit(a, 0);
        // an immediate byte is not an instruction
        map.hit(a, 1);
        map.hit(b, 4);

        let summary = map.summary([&a], &code);
        assert_eq!(summary, CoverageSummary { covered: 1, total: 4 });
        assert_eq!(summary.to_string(), "1/4, 25%");

        let summary = map.summary([&a, &b], &code);
        assert_eq!(summary.to_string(), "2/4, 50%");
        assert_eq!(CoverageSummary::default().to_string(), "0/0, 0%");
    }
}
