//! # chainfuzz-evm-fuzz
//!
//! Value corpus, transaction generation and trace analysis of the chainfuzz engine.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

pub mod analyzer;
pub use analyzer::{AnalysisOptions, ExactResult, ExecutionOutcome, Overflow, TraceAnalyzer};

pub mod contracts;
pub use contracts::{DeployedContract, DeployedContracts, FALLBACK};

pub mod corpus;
pub use corpus::{CorpusSizes, ValueCorpus};

mod error;
pub use error::FuzzError;

pub mod generator;
pub use generator::{Hint, TxDescriptor, TxGenerator};

pub mod kind;
pub use kind::FuzzKind;
