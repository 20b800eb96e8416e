//! Canned executions for mocked contracts.

use alloy_primitives::{B256, Bytes, U256};
use chainfuzz_evm_core::{Execution, Receipt, TraceStep, opcode};

fn execution(status: bool, output: Bytes, trace: Vec<TraceStep>) -> Execution {
    let receipt = Receipt { status, gas_used: 21_000, contract_address: None };
    Execution { receipt, output, trace }
}

/// A call that stops without output.
pub fn stop() -> Execution {
    execution(true, Bytes::new(), vec![TraceStep::new(0, opcode::STOP, 1)])
}

/// A call returning `output` from memory offset zero.
pub fn returns(output: impl Into<Bytes>) -> Execution {
    let output = output.into();
    let trace = vec![
        TraceStep::new(0, opcode::PUSH1, 1),
        TraceStep::new(2, opcode::RETURN, 1)
            .with_stack([U256::from(output.len()), U256::ZERO])
            .with_memory(output.clone()),
    ];
    execution(true, output, trace)
}

pub fn returns_word(word: B256) -> Execution {
    returns(Bytes::copy_from_slice(word.as_slice()))
}

/// A call returning an ABI encoded `bool`.
pub fn returns_bool(value: bool) -> Execution {
    returns_word(B256::with_last_byte(value as u8))
}

/// A call reverting at the top level.
pub fn revert() -> Execution {
    execution(
        false,
        Bytes::new(),
        vec![
            TraceStep::new(0, opcode::PUSH1, 1),
            TraceStep::new(2, opcode::REVERT, 1).with_stack([U256::ZERO, U256::ZERO]),
        ],
    )
}

/// A call hitting the invalid instruction, as failed assertions do.
pub fn assertion_failure() -> Execution {
    execution(false, Bytes::new(), vec![TraceStep::new(0, opcode::INVALID, 1)])
}

/// A successful call whose addition wraps: `2^255 + 2^255 = 0`.
pub fn overflowing_add() -> Execution {
    let half = U256::from(1) << 255;
    execution(
        true,
        Bytes::new(),
        vec![
            TraceStep::new(0, opcode::ADD, 1).with_stack([half, half]),
            TraceStep::new(1, opcode::STOP, 1).with_stack([U256::ZERO]),
        ],
    )
}

/// A creation returning `runtime_code` as the code of the new contract.
pub fn deploys(runtime_code: impl Into<Bytes>) -> Execution {
    let code = runtime_code.into();
    let trace = vec![
        TraceStep::new(0, opcode::PUSH1, 1),
        TraceStep::new(2, opcode::RETURN, 1)
            .with_stack([U256::from(code.len()), U256::ZERO])
            .with_memory(code),
    ];
    execution(true, Bytes::new(), trace)
}
