//! Structured opcode level execution traces.

use revm::bytecode::OpCode;
use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// The state of the machine right before an instruction is executed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStep {
    pub pc: usize,
    pub op: u8,
    /// Call depth, starting at 1 for the frame of the transaction itself.
    pub depth: u64,
    /// Operand stack, top of stack last.
    pub stack: Vec<U256>,
    pub memory: Bytes,
}

impl TraceStep {
    pub fn new(pc: usize, op: u8, depth: u64) -> Self {
        Self { pc, op, depth, ..Default::default() }
    }

    pub fn with_stack(mut self, stack: impl IntoIterator<Item = U256>) -> Self {
        self.stack = stack.into_iter().collect();
        self
    }

    pub fn with_memory(mut self, memory: impl Into<Bytes>) -> Self {
        self.memory = memory.into();
        self
    }

    /// Returns the opcode of the step, `None` if it is not a defined instruction.
    #[inline]
    pub fn opcode(&self) -> Option<OpCode> {
        OpCode::new(self.op)
    }

    /// Returns the `n`th stack item counted from the top, `0` being the top of the stack.
    #[inline]
    pub fn peek(&self, n: usize) -> Option<U256> {
        self.stack.len().checked_sub(n + 1).map(|i| self.stack[i])
    }

    /// Returns the address a call from this step targets.
    ///
    /// The callee is the second stack item of every call opcode.
    pub fn call_target(&self) -> Option<Address> {
        self.peek(1).map(|word| Address::from_word(word.into()))
    }

    /// Returns the memory slice `[offset, offset + size)`, clamped to the memory size.
    pub fn memory_slice(&self, offset: U256, size: U256) -> &[u8] {
        let len = self.memory.len();
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(len);
        let end = start.saturating_add(usize::try_from(size).unwrap_or(usize::MAX)).min(len);
        &self.memory[start..end]
    }
}

/// An execution trace, in execution order.
pub type Trace = Vec<TraceStep>;
