use crate::CoverageMap;
use alloy_primitives::Address;
use chainfuzz_evm_core::TraceStep;

/// Attributes the program counters of a trace to the contracts that executed them.
///
/// Tracks the addresses of the open call frames: a step deeper than its predecessor entered the
/// contract the predecessor called, a shallower step returned from one or more frames.
#[derive(Clone, Debug)]
pub struct CoverageCollector {
    call_stack: Vec<Address>,
}

impl CoverageCollector {
    /// Creates a collector for a transaction sent to `root`.
    pub fn new(root: Address) -> Self {
        Self { call_stack: vec![root] }
    }

    /// Address of the frame currently executing.
    pub fn current(&self) -> Address {
        self.call_stack.last().copied().unwrap_or_default()
    }

    /// Records every step of `trace` into `map`.
    pub fn collect(&mut self, trace: &[TraceStep], map: &mut CoverageMap) {
        let mut prev: Option<&TraceStep> = None;
        for step in trace {
            if let Some(prev) = prev {
                self.step(prev, step);
            }
            map.hit(self.current(), step.pc);
            prev = Some(step);
        }
    }

    fn step(&mut self, prev: &TraceStep, step: &TraceStep) {
        if step.depth > prev.depth {
            let callee = prev.call_target().unwrap_or_default();
            trace!(target: "coverage", %callee, depth = step.depth, "entered call frame");
            self.call_stack.push(callee);
        } else if step.depth < prev.depth {
            for _ in step.depth..prev.depth {
                if self.call_stack.len() == 1 {
                    break;
                }
                let callee = self.call_stack.pop();
                trace!(target: "coverage", ?callee, depth = step.depth, "left call frame");
            }
        }
    }
}
