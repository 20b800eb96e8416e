//! # chainfuzz-evm-core
//!
//! Core abstractions over the execution backend: the backend trait, structured traces,
//! transactions and the session snapshot.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

pub mod backend;
pub mod bytecode;
pub mod constants;
pub mod snapshot;
pub mod trace;
pub mod transaction;

pub use backend::{BackendError, BlockEnv, Execution, ExecutionBackend, Receipt};
pub use revm::bytecode::{OpCode, opcode};
pub use snapshot::SnapshotController;
pub use trace::{Trace, TraceStep};
pub use transaction::{FuzzTransaction, SignedTransaction, TxLegacy};
