use revm::bytecode::opcode;
use std::slice;

/// An iterator that yields opcodes and their immediate data.
///
/// If the bytecode is not well-formed, the iterator will still yield opcodes, but the immediate
/// data may be incorrect. For example, if the bytecode is `PUSH2 0x69`, the iterator will yield
/// `PUSH2, &[]`.
#[derive(Clone, Debug)]
pub struct InstIter<'a> {
    iter: slice::Iter<'a, u8>,
}

impl<'a> InstIter<'a> {
    /// Create a new iterator over the given bytecode slice.
    #[inline]
    pub fn new(slice: &'a [u8]) -> Self {
        Self { iter: slice.iter() }
    }

    /// Returns a new iterator that also yields the program counter alongside the opcode and
    /// immediate data.
    #[inline]
    pub fn with_pc(self) -> InstIterWithPc<'a> {
        InstIterWithPc { iter: self, pc: 0 }
    }
}

impl<'a> Iterator for InstIter<'a> {
    type Item = Inst<'a>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|&opcode| {
            let len = imm_len(opcode) as usize;
            let (immediate, rest) = self.iter.as_slice().split_at_checked(len).unwrap_or_default();
            self.iter = rest.iter();
            Inst { opcode, immediate }
        })
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.iter.len();
        ((len != 0) as usize, Some(len))
    }
}

impl std::iter::FusedIterator for InstIter<'_> {}

/// A bytecode iterator that yields opcodes and their immediate data, alongside the program counter.
///
/// Created by calling [`InstIter::with_pc`].
#[derive(Debug)]
pub struct InstIterWithPc<'a> {
    iter: InstIter<'a>,
    pc: usize,
}

impl<'a> Iterator for InstIterWithPc<'a> {
    type Item = (usize, Inst<'a>);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|inst| {
            let pc = self.pc;
            self.pc += 1 + inst.immediate.len();
            (pc, inst)
        })
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl std::iter::FusedIterator for InstIterWithPc<'_> {}

/// An opcode and its immediate data. Returned by [`InstIter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Inst<'a> {
    /// The opcode byte, which may not be a defined instruction, e.g. inside the metadata.
    pub opcode: u8,
    /// The immediate data, if any.
    ///
    /// If an opcode is missing immediate data, e.g. malformed or bytecode hash, this will be an
    /// empty slice.
    pub immediate: &'a [u8],
}

/// Returns the length of the immediate data for the given opcode, or `0` if none.
#[inline]
const fn imm_len(op: u8) -> u8 {
    match op {
        opcode::PUSH1..=opcode::PUSH32 => op - opcode::PUSH0,
        _ => 0,
    }
}

/// Returns the program counters of all instructions in `code`.
///
/// These are the offsets a trace can visit, so their count is the denominator of coverage.
pub fn instruction_offsets(code: &[u8]) -> impl Iterator<Item = usize> + '_ {
    InstIter::new(code).with_pc().map(|(pc, _)| pc)
}
