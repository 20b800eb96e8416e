//! Classifying execution traces and learning from them.

use crate::{
    contracts::DeployedContracts,
    corpus::ValueCorpus,
    generator::TxDescriptor,
};
use alloy_dyn_abi::FunctionExt;
use alloy_primitives::{Bytes, U256, U512};
use chainfuzz_common::artifacts::find_metadata_hash;
use chainfuzz_config::CorpusConfig;
use chainfuzz_evm_core::{
    BackendError, Execution, OpCode, Receipt, SignedTransaction, Trace, TraceStep, opcode,
};
use chainfuzz_evm_coverage::{CoverageCollector, CoverageMap};
use std::fmt;

/// What the analyzer does besides classifying a trace.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// Feed decoded return values into the corpus.
    pub update_corpus: bool,
    pub update_coverage: bool,
    /// Feed plausible timestamps found on the stack into the corpus.
    pub harvest_timestamps: bool,
    /// Register contracts created by the transaction.
    pub detect_deployments: bool,
}

impl AnalysisOptions {
    /// Options used while replaying the deployment of the project.
    pub const DEPLOYMENT: Self = Self {
        update_corpus: false,
        update_coverage: true,
        harvest_timestamps: true,
        detect_deployments: true,
    };
}

/// An arithmetic instruction whose result differs from the exact result of its operands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Overflow {
    pub pc: usize,
    pub depth: u64,
    pub op: OpCode,
    pub a: U256,
    pub b: U256,
    /// The result left on the stack.
    pub result: U256,
    pub expected: ExactResult,
}

impl fmt::Display for Overflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {}={}), expected:{}", self.a, self.op, self.b, self.result, self.expected)
    }
}

/// The mathematically exact result of an arithmetic instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExactResult {
    Value(U512),
    /// The negation of the value.
    Negative(U256),
    /// Too large to be represented in 512 bits.
    Unbounded,
}

impl ExactResult {
    /// Computes `a op b` without wrapping.
    ///
    /// Returns `None` if `op` is not a checked arithmetic opcode.
    pub fn compute(op: OpCode, a: U256, b: U256) -> Option<Self> {
        let (wide_a, wide_b) = (widen(a), widen(b));
        Some(match op.get() {
            opcode::ADD => Self::Value(wide_a + wide_b),
            opcode::MUL => Self::Value(wide_a * wide_b),
            opcode::SUB if a >= b => Self::Value(wide_a - wide_b),
            opcode::SUB => Self::Negative(b - a),
            opcode::EXP => wide_a.checked_pow(wide_b).map_or(Self::Unbounded, Self::Value),
            _ => return None,
        })
    }

    /// Returns `true` if `result` is the exact result.
    pub fn matches(&self, result: U256) -> bool {
        matches!(self, Self::Value(value) if *value == widen(result))
    }
}

impl fmt::Display for ExactResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => write!(f, "{value}"),
            Self::Negative(value) => write!(f, "-{value}"),
            Self::Unbounded => f.write_str("more than 512 bits"),
        }
    }
}

fn widen(value: U256) -> U512 {
    U512::from_be_slice(&value.to_be_bytes::<32>())
}

/// The verdict on an executed transaction.
#[derive(Clone, Debug, Default)]
pub struct ExecutionOutcome {
    pub output: Bytes,
    pub receipt: Receipt,
    /// Smallest call depth at which `REVERT` was executed.
    pub revert_depth: Option<u64>,
    /// Smallest call depth at which the invalid instruction was executed.
    pub assertion_depth: Option<u64>,
    /// The first overflowing arithmetic instruction.
    pub overflow: Option<Overflow>,
    pub trace: Trace,
}

impl ExecutionOutcome {
    /// The outcome of a transaction the backend refused to apply.
    ///
    /// Treated like a revert of the top level call so that the retry heuristics apply.
    pub fn rejected(error: &BackendError) -> Self {
        debug!(target: "analyzer", %error, "transaction rejected");
        Self { revert_depth: Some(1), ..Default::default() }
    }

    /// Returns `true` if the top level call reverted.
    pub fn reverted(&self) -> bool {
        self.revert_depth == Some(1)
    }
}

/// Analyzes traces, updating the session state they teach about.
pub struct TraceAnalyzer<'a> {
    pub corpus: &'a mut ValueCorpus,
    pub coverage: &'a mut CoverageMap,
    pub contracts: &'a mut DeployedContracts,
    pub corpus_config: &'a CorpusConfig,
}

impl TraceAnalyzer<'_> {
    /// Classifies the execution of `tx`.
    ///
    /// `descriptor` describes the generated call, it is `None` for replayed transactions.
    pub fn analyze(
        &mut self,
        tx: &SignedTransaction,
        descriptor: Option<&TxDescriptor>,
        execution: Execution,
        options: AnalysisOptions,
    ) -> ExecutionOutcome {
        let Execution { receipt, output, trace } = execution;
        let mut outcome =
            ExecutionOutcome { output, receipt, trace: Vec::new(), ..Default::default() };

        let mut collector = match tx.to() {
            Some(to) if options.update_coverage => Some(CoverageCollector::new(to)),
            _ => None,
        };

        for (index, step) in trace.iter().enumerate() {
            if options.harvest_timestamps {
                self.harvest_timestamps(step);
            }

            if outcome.overflow.is_none() {
                outcome.overflow = check_overflow(step, trace.get(index + 1));
            }

            match step.op {
                opcode::INVALID => min_depth(&mut outcome.assertion_depth, step.depth),
                opcode::REVERT => min_depth(&mut outcome.revert_depth, step.depth),
                opcode::RETURN if options.detect_deployments => self.detect_deployment(tx, step),
                _ => {}
            }
        }

        if let Some(collector) = &mut collector {
            collector.collect(&trace, self.coverage);
        }

        if options.update_corpus
            && !outcome.reverted()
            && !outcome.output.is_empty()
            && let Some(function) = descriptor.and_then(|d| d.function.as_ref())
        {
            match function.abi_decode_output(&outcome.output) {
                Ok(values) => {
                    for value in &values {
                        self.corpus.insert_value(value);
                    }
                }
                Err(error) => {
                    warn!(
                        target: "analyzer",
                        method = %function.name,
                        %error,
                        "failed to decode output"
                    );
                }
            }
        }

        if let Some(overflow) = &outcome.overflow {
            debug!(target: "analyzer", %overflow, "overflow detected");
        }
        outcome.trace = trace;
        outcome
    }

    fn harvest_timestamps(&mut self, step: &TraceStep) {
        for value in &step.stack {
            if let Ok(value) = u64::try_from(*value)
                && self.corpus_config.is_plausible_timestamp(value)
            {
                self.corpus.timestamps.add(value);
            }
        }
    }

    /// Registers the contract whose runtime code a top level creation returns.
    fn detect_deployment(&mut self, tx: &SignedTransaction, step: &TraceStep) {
        if step.depth != 1 || tx.to().is_some() {
            return;
        }
        let (Some(offset), Some(size)) = (step.peek(0), step.peek(1)) else { return };
        let Some(hash) = find_metadata_hash(step.memory_slice(offset, size)) else { return };
        let Some(name) = self.contracts.contract_by_hash(&hash).map(str::to_string) else {
            warn!(target: "analyzer", %hash, "deployed code with unknown metadata hash");
            return;
        };
        let address = tx.from.create(tx.nonce);
        self.contracts.register(&name, address);
        self.corpus.addresses.add(address);
    }
}

fn min_depth(current: &mut Option<u64>, depth: u64) {
    if current.is_none_or(|current| depth < current) {
        *current = Some(depth);
    }
}

/// Returns `true` for the arithmetic opcodes checked for overflows.
const fn is_checked_arithmetic(op: u8) -> bool {
    matches!(op, opcode::ADD | opcode::SUB | opcode::MUL | opcode::EXP)
}

/// Compares the result of an arithmetic `step` with the top of the stack of the step after it.
fn check_overflow(step: &TraceStep, next: Option<&TraceStep>) -> Option<Overflow> {
    if !is_checked_arithmetic(step.op) {
        return None;
    }
    let op = step.opcode()?;
    // the instruction did not complete, e.g. it ran out of gas
    let next = next.filter(|next| next.depth == step.depth)?;
    let (a, b, result) = (step.peek(0)?, step.peek(1)?, next.peek(0)?);
    let expected = ExactResult::compute(op, a, b)?;
    if expected.matches(result) {
        return None;
    }
    Some(Overflow { pc: step.pc, depth: step.depth, op, a, b, result, expected })
}
