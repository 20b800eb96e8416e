//! Loading a compiled and deployed project.

use crate::{
    accounts::Accounts,
    artifacts::ContractArtifact,
    errors::ProjectError,
    fs,
    transactions::{DeploymentTx, read_deployment_txs},
};
use alloy_primitives::map::B256HashMap;
use chainfuzz_config::ContractConfigs;
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// The metadata file pointing to the parts of a project.
///
/// Relative paths are resolved against the directory of the metadata file.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ProjectMetadata {
    /// Root of the build system project, containing `build/contracts`.
    #[serde(rename = "tuffleProjDir", alias = "truffleProjDir")]
    pub project_dir: PathBuf,
    /// Deployment transactions, one JSON object per line.
    pub transactions: PathBuf,
    pub accounts: PathBuf,
    /// Per contract fuzzing settings.
    #[serde(default)]
    pub config: Option<PathBuf>,
}

impl ProjectMetadata {
    /// Directory of the compiled artifacts, relative to the project directory.
    pub const ARTIFACTS_DIR: &'static str = "build/contracts";

    fn resolve_paths(&mut self, root: &Path) {
        for path in [&mut self.project_dir, &mut self.transactions, &mut self.accounts]
            .into_iter()
            .chain(self.config.as_mut())
        {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }
    }
}

/// Everything known about the project under test before the session starts.
#[derive(Clone, Debug, Default)]
pub struct Project {
    /// Compiled contracts by name.
    pub artifacts: BTreeMap<String, ContractArtifact>,
    pub accounts: Accounts,
    /// Transactions replayed to deploy the project.
    pub deployments: Vec<DeploymentTx>,
    pub contract_configs: ContractConfigs,
}

impl Project {
    /// Loads the project described by the metadata file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let path = path.as_ref();
        let mut metadata: ProjectMetadata = fs::read_json_file(path)?;
        metadata.resolve_paths(path.parent().unwrap_or(Path::new("")));
        Self::load_from_metadata(&metadata)
    }

    /// Loads the project from already parsed metadata.
    pub fn load_from_metadata(metadata: &ProjectMetadata) -> Result<Self, ProjectError> {
        let artifacts_dir = metadata.project_dir.join(ProjectMetadata::ARTIFACTS_DIR);
        let artifacts = fs::json_files(&artifacts_dir)?
            .iter()
            .map(|path| ContractArtifact::read(path))
            .collect::<Result<Vec<_>, _>>()?;

        let contract_configs = match &metadata.config {
            Some(path) => fs::read_json_file(path)?,
            None => ContractConfigs::default(),
        };

        let project = Self::new(
            artifacts,
            Accounts::load(&metadata.accounts)?,
            read_deployment_txs(&metadata.transactions)?,
            contract_configs,
        );
        info!(
            target: "project",
            artifacts = project.artifacts.len(),
            deployments = project.deployments.len(),
            accounts = project.accounts.len(),
            "loaded project"
        );
        Ok(project)
    }

    pub fn new(
        artifacts: impl IntoIterator<Item = ContractArtifact>,
        accounts: Accounts,
        deployments: Vec<DeploymentTx>,
        contract_configs: ContractConfigs,
    ) -> Self {
        let artifacts =
            artifacts.into_iter().map(|artifact| (artifact.name.clone(), artifact)).collect();
        Self { artifacts, accounts, deployments, contract_configs }
    }

    /// Returns the artifact of the contract called `name`.
    pub fn artifact(&self, name: &str) -> Result<&ContractArtifact, ProjectError> {
        self.artifacts.get(name).ok_or_else(|| ProjectError::UnknownContract(name.to_string()))
    }

    /// Returns `true` if `name` is a library contract.
    pub fn is_library(&self, name: &str) -> bool {
        self.artifacts.get(name).is_some_and(|artifact| artifact.is_library)
    }

    /// Maps the metadata hash of every artifact to the contract name.
    pub fn metadata_hashes(&self) -> B256HashMap<String> {
        let mut hashes = B256HashMap::default();
        for artifact in self.artifacts.values() {
            let Some(hash) = artifact.metadata_hash else { continue };
            if let Some(previous) = hashes.insert(hash, artifact.name.clone()) {
                warn!(
                    target: "project",
                    %hash,
                    %previous,
                    contract = %artifact.name,
                    "contracts share a metadata hash"
                );
            }
        }
        hashes
    }
}
