//! A fuzzing session: the backend together with everything learned about it so far.

use crate::{FuzzResults, FuzzStatistics};
use chainfuzz_common::{DeploymentTx, Project};
use chainfuzz_config::FuzzConfig;
use chainfuzz_evm_core::{
    BackendError, BlockEnv, ExecutionBackend, FuzzTransaction, SnapshotController, TxLegacy,
};
use chainfuzz_evm_coverage::CoverageMap;
use chainfuzz_evm_fuzz::{
    AnalysisOptions, DeployedContracts, ExecutionOutcome, FuzzError, Hint, TraceAnalyzer,
    TxDescriptor, TxGenerator, ValueCorpus,
};
use rand::{SeedableRng, rngs::StdRng};

/// Owns all mutable state of one fuzzing session.
///
/// Sessions share nothing, so several of them can run side by side.
pub struct FuzzSession<B: ExecutionBackend> {
    pub(crate) backend: B,
    pub(crate) project: Project,
    pub(crate) config: FuzzConfig,
    pub(crate) contracts: DeployedContracts,
    pub(crate) corpus: ValueCorpus,
    pub(crate) coverage: CoverageMap,
    pub(crate) stats: FuzzStatistics,
    pub(crate) results: FuzzResults,
    pub(crate) snapshot: SnapshotController<B>,
    pub(crate) rng: StdRng,
    /// Transactions sent by rounds, retries included.
    pub(crate) tx_count: u64,
}

impl<B: ExecutionBackend> FuzzSession<B> {
    /// Deploys `project` on `backend` and prepares the session.
    ///
    /// Funds the accounts, replays the deployment transactions, seeds the corpus, selects the
    /// fuzzable contracts and takes the session snapshot.
    pub fn new(project: Project, config: FuzzConfig, backend: B) -> Result<Self, FuzzError> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut session = Self {
            backend,
            contracts: DeployedContracts::new(&project),
            project,
            config,
            corpus: ValueCorpus::default(),
            coverage: CoverageMap::default(),
            stats: FuzzStatistics::default(),
            results: FuzzResults::default(),
            snapshot: SnapshotController::default(),
            rng,
            tx_count: 0,
        };
        session.bootstrap()?;
        Ok(session)
    }

    fn bootstrap(&mut self) -> Result<(), FuzzError> {
        for account in self.project.accounts.iter() {
            self.backend.set_balance(account.address, account.balance);
        }

        let deployments = std::mem::take(&mut self.project.deployments);
        let replayed = deployments.iter().try_for_each(|tx| self.replay(tx));
        self.project.deployments = deployments;
        replayed?;

        self.corpus.seed(&self.config.corpus, &self.project.accounts, &mut self.rng);
        self.contracts.finalize(&self.project, &self.config)?;
        for config in self.project.contract_configs.values() {
            for timestamp in &config.timestamps {
                self.corpus.timestamps.add(*timestamp);
            }
        }

        self.snapshot.take(&self.backend);
        info!(
            target: "session",
            fuzzable = ?self.contracts.fuzzable(),
            corpus = ?self.corpus.sizes(),
            "session ready"
        );
        Ok(())
    }

    /// Applies a recorded deployment transaction.
    fn replay(&mut self, deployment: &DeploymentTx) -> Result<(), FuzzError> {
        let account = self.project.accounts.get(&deployment.from)?;
        let mut tx = match deployment.to {
            Some(to) => TxLegacy::call(
                to,
                deployment.nonce,
                deployment.gas,
                deployment.value,
                deployment.input.clone(),
            ),
            None => TxLegacy::create(
                deployment.nonce,
                deployment.gas,
                deployment.value,
                deployment.input.clone(),
            ),
        };
        tx.gas_price = deployment.gas_price.saturating_to();
        let tx = tx.sign(&account.signer)?;

        let env = BlockEnv { timestamp: self.corpus.timestamps.current(), ..Default::default() };
        let execution = match self.backend.apply_transaction(&tx, &env) {
            Ok(execution) => execution,
            Err(BackendError::Rejected { reason }) => {
                warn!(
                    target: "session",
                    from = %deployment.from,
                    nonce = deployment.nonce,
                    %reason,
                    "deployment transaction rejected"
                );
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };
        self.analyzer().analyze(&tx, None, execution, AnalysisOptions::DEPLOYMENT);
        trace!(target: "session", hash = %tx.hash(), from = %tx.from, "replayed deployment");
        Ok(())
    }

    /// Generates a transaction from `hint`, applies it and analyzes its trace.
    ///
    /// A transaction the backend rejects counts as sent and reverted.
    pub fn execute(
        &mut self,
        hint: &mut Hint,
    ) -> Result<(TxDescriptor, ExecutionOutcome), FuzzError> {
        let env = self.next_block_env();
        let mut generator = TxGenerator {
            contracts: &self.contracts,
            accounts: &self.project.accounts,
            corpus: &mut self.corpus,
            config: &self.config,
            rng: &mut self.rng,
        };
        let (tx, descriptor) = generator.generate(&self.backend, hint)?;
        self.results.touch(&descriptor.contract);

        let execution = self.backend.apply_transaction(&tx, &env);
        self.tx_count += 1;
        let outcome = match execution {
            Ok(execution) => {
                let options = AnalysisOptions {
                    update_corpus: true,
                    update_coverage: true,
                    harvest_timestamps: self.config.harvest_timestamps,
                    detect_deployments: false,
                };
                self.analyzer().analyze(&tx, Some(&descriptor), execution, options)
            }
            Err(err @ BackendError::Rejected { .. }) => ExecutionOutcome::rejected(&err),
            Err(err) => return Err(err.into()),
        };
        Ok((descriptor, outcome))
    }

    /// Returns the block the next transaction is executed in.
    ///
    /// The timestamp stays at the current corpus timestamp for `timestamp_interval`
    /// transactions, then moves on to the next one. Completing a lap of the timestamp pool
    /// reverts the world state to the session snapshot.
    fn next_block_env(&mut self) -> BlockEnv {
        let timestamp = if self.stats.since_reset() >= self.config.timestamp_interval {
            let (timestamp, lap) = self.corpus.timestamps.next_or_now();
            self.stats.reset_counter();
            debug!(target: "session", timestamp, lap, "advanced block timestamp");
            if lap {
                self.revert_to_snapshot();
            }
            timestamp
        } else {
            self.corpus.timestamps.current()
        };
        BlockEnv { number: self.tx_count + 1, timestamp, ..Default::default() }
    }

    /// Restores the world state captured when the session started.
    pub fn revert_to_snapshot(&mut self) -> bool {
        self.snapshot.revert(&mut self.backend)
    }

    fn analyzer(&mut self) -> TraceAnalyzer<'_> {
        TraceAnalyzer {
            corpus: &mut self.corpus,
            coverage: &mut self.coverage,
            contracts: &mut self.contracts,
            corpus_config: &self.config.corpus,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn config(&self) -> &FuzzConfig {
        &self.config
    }

    pub fn contracts(&self) -> &DeployedContracts {
        &self.contracts
    }

    pub fn corpus(&self) -> &ValueCorpus {
        &self.corpus
    }

    pub fn corpus_mut(&mut self) -> &mut ValueCorpus {
        &mut self.corpus
    }

    pub fn coverage(&self) -> &CoverageMap {
        &self.coverage
    }

    pub fn stats(&self) -> &FuzzStatistics {
        &self.stats
    }

    pub fn results(&self) -> &FuzzResults {
        &self.results
    }

    /// Number of transactions sent by rounds so far.
    pub fn tx_count(&self) -> u64 {
        self.tx_count
    }
}
