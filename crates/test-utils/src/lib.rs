//! # chainfuzz-test-utils
//!
//! Fixtures and an in-memory [`ExecutionBackend`](chainfuzz_evm_core::ExecutionBackend) used by
//! the chainfuzz tests.

#![warn(unused_crate_dependencies, unreachable_pub)]
#![allow(clippy::disallowed_macros)]

#[macro_use]
extern crate tracing;

mod backend;
pub use backend::{CallContext, Handler, MockBackend, MockState};

pub mod fixtures;

pub mod traces;

/// Initializes tracing for tests.
pub fn init_tracing() {
    let _ = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
