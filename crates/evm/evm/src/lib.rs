//! # chainfuzz-evm
//!
//! Fuzzing sessions: bootstrap, retry heuristics, statistics and campaign reports.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

mod heuristics;

pub mod results;
pub use results::{Finding, FuzzResults};

mod runner;
pub use runner::{FuzzReport, run_campaign};

pub mod session;
pub use session::FuzzSession;

pub mod stats;
pub use stats::{FuzzStatistics, MethodStats};

pub use chainfuzz_evm_core::{backend, constants, opcode, snapshot, trace, transaction};
pub use chainfuzz_evm_coverage as coverage;
pub use chainfuzz_evm_fuzz as fuzz;
