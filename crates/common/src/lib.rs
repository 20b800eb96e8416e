//! Common utilities for loading the project under test: compiled artifacts, accounts and the
//! recorded deployment.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

pub mod accounts;
pub mod artifacts;
pub mod errors;
pub mod fs;
pub mod project;
pub mod serde_helpers;
pub mod transactions;

pub use accounts::{Account, Accounts};
pub use artifacts::ContractArtifact;
pub use errors::{FsPathError, ProjectError};
pub use project::{Project, ProjectMetadata};
pub use transactions::DeploymentTx;
