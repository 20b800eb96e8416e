//! Rounds and the retry tree grown from a reverted transaction.

use crate::{FuzzSession, results::Finding};
use alloy_primitives::{U256, hex};
use chainfuzz_evm_core::{ExecutionBackend, constants::TRUE_WORD};
use chainfuzz_evm_fuzz::{FuzzError, Hint};
use std::ops::ControlFlow;

impl<B: ExecutionBackend> FuzzSession<B> {
    /// Runs one round starting from `hint`.
    ///
    /// Returns [`ControlFlow::Break`] when a finding ends the session.
    pub fn run_round(&mut self, hint: Hint) -> Result<ControlFlow<()>, FuzzError> {
        self.round(hint, 0)
    }

    fn round(&mut self, mut hint: Hint, depth: u32) -> Result<ControlFlow<()>, FuzzError> {
        let (descriptor, outcome) = self.execute(&mut hint)?;
        let (contract, method) = (descriptor.contract.as_str(), descriptor.method.as_str());
        let reverted = outcome.reverted();

        if self.config.is_invariant_probe(method) {
            if reverted {
                self.results.record(contract, method, &Finding::RevertInProbe, String::new());
                return Ok(ControlFlow::Break(()));
            }
            // only a returned word can contradict the property
            if outcome.output.len() == 32 && outcome.output.as_ref() != TRUE_WORD.as_slice() {
                let detail = hex::encode_prefixed(&outcome.output);
                self.results.record(contract, method, &Finding::PropertyViolation, detail);
                return Ok(ControlFlow::Break(()));
            }
        }

        if let Some(overflow) = &outcome.overflow
            && !reverted
        {
            self.results.record(contract, method, &Finding::Overflow, overflow.to_string());
        }
        if outcome.assertion_depth.is_some() {
            self.results.record(contract, method, &Finding::AssertionFailure, String::new());
        }

        if self.config.statistics {
            self.stats.record_outcome(contract, method, reverted);
        } else {
            self.stats.increment();
        }

        if !reverted || depth >= self.config.max_retry_depth {
            return Ok(ControlFlow::Continue(()));
        }

        if self.config.retry_half_value && !descriptor.value.is_zero() {
            let mut retry = hint.clone();
            retry.amount = Some(descriptor.value / U256::from(2));
            retry.sender = Some(descriptor.sender);
            debug!(
                target: "heuristics",
                contract,
                method,
                depth,
                amount = ?retry.amount,
                "retrying with half the value"
            );
            if self.round(retry, depth + 1)?.is_break() {
                return Ok(ControlFlow::Break(()));
            }
        }

        if self.config.retry_different_sender {
            let mut retry = hint;
            retry.sender = None;
            debug!(target: "heuristics", contract, method, depth, "retrying with another sender");
            return self.round(retry, depth + 1);
        }

        Ok(ControlFlow::Continue(()))
    }
}
