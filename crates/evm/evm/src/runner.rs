//! Campaigns: corner cases, the main loop and the final report.

use crate::{FuzzResults, FuzzSession};
use alloy_primitives::U256;
use chainfuzz_common::Project;
use chainfuzz_config::FuzzConfig;
use chainfuzz_evm_core::ExecutionBackend;
use chainfuzz_evm_coverage::CoverageSummary;
use chainfuzz_evm_fuzz::{CorpusSizes, FuzzError, Hint};
use eyre::Result;
use serde_json::json;
use std::{
    collections::BTreeMap,
    ops::ControlFlow,
    path::Path,
    time::{Duration, Instant},
};

/// Everything a campaign produced.
#[derive(Clone, Debug)]
pub struct FuzzReport {
    /// Findings by contract. Contracts with coverage also carry a `covered` entry.
    pub results: FuzzResults,
    /// Coverage of the runtime code of every deployed contract.
    pub coverage: BTreeMap<String, CoverageSummary>,
    /// Formatted failure statistics, empty unless statistics were enabled.
    pub statistics: BTreeMap<String, BTreeMap<String, String>>,
    pub corpus: CorpusSizes,
    pub transactions: u64,
    pub elapsed: Duration,
    /// Whether a finding ended the campaign before the transaction limit.
    pub terminated: bool,
}

impl FuzzReport {
    /// Transactions per second.
    pub fn tx_rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 { 0.0 } else { self.transactions as f64 / secs }
    }

    /// Coverage summed over all contracts.
    pub fn total_coverage(&self) -> CoverageSummary {
        let mut total = CoverageSummary::default();
        for summary in self.coverage.values() {
            total += summary;
        }
        total
    }

    pub fn to_json(&self) -> serde_json::Value {
        let coverage: BTreeMap<_, _> =
            self.coverage.iter().map(|(name, summary)| (name, summary.to_string())).collect();
        json!({
            "results": &self.results,
            "coverage": coverage,
            "statistics": &self.statistics,
            "corpus": &self.corpus,
            "transactions": self.transactions,
            "elapsed_ms": self.elapsed.as_millis() as u64,
            "tx_rate": self.tx_rate(),
            "terminated": self.terminated,
        })
    }
}

impl<B: ExecutionBackend> FuzzSession<B> {
    /// Runs the corner cases, then rounds until the transaction limit is reached or a finding
    /// ends the campaign.
    pub fn run(&mut self) -> Result<FuzzReport, FuzzError> {
        let start = Instant::now();
        info!(target: "session", limit = self.config.limit, "starting campaign");

        let mut terminated = false;
        if self.config.corner_cases {
            terminated = self.run_corner_cases()?.is_break();
        }
        if !terminated {
            terminated = self.run_rounds(self.config.limit)?.is_break();
        }

        let report = self.report(start.elapsed(), terminated);
        info!(
            target: "session",
            transactions = report.transactions,
            tx_rate = format_args!("{:.2}", report.tx_rate()),
            coverage = %report.total_coverage(),
            terminated,
            "campaign finished"
        );
        Ok(report)
    }

    /// Calls the fallback of every fuzzable contract, then sends one wei to every method that
    /// does not accept value.
    pub fn run_corner_cases(&mut self) -> Result<ControlFlow<()>, FuzzError> {
        let fuzzable = self.contracts.fuzzable().to_vec();
        for contract in &fuzzable {
            if self.run_round(Hint::fallback(contract))?.is_break() {
                return Ok(ControlFlow::Break(()));
            }
        }

        for contract in &fuzzable {
            let methods =
                self.contracts.get(contract).map(|c| c.methods.clone()).unwrap_or_default();
            for method in methods {
                if self.contracts.is_payable(contract, &method)
                    || self.config.is_invariant_probe(&method)
                {
                    continue;
                }
                let hint = Hint::call(contract, method).with_amount(U256::from(1));
                if self.run_round(hint)?.is_break() {
                    return Ok(ControlFlow::Break(()));
                }
            }
        }
        debug!(target: "session", transactions = self.tx_count, "ran corner cases");
        Ok(ControlFlow::Continue(()))
    }

    /// Runs rounds from empty hints until `limit` transactions were sent in total.
    ///
    /// Reverts to the session snapshot every `snapshot_revert_interval` rounds if snapshots are
    /// enabled.
    pub fn run_rounds(&mut self, limit: u64) -> Result<ControlFlow<()>, FuzzError> {
        let mut rounds = 0u64;
        while self.tx_count < limit {
            if self.run_round(Hint::default())?.is_break() {
                let transactions = self.tx_count;
                info!(target: "session", transactions, "finding ended the campaign");
                return Ok(ControlFlow::Break(()));
            }
            rounds += 1;
            if self.config.snapshots
                && self.config.snapshot_revert_interval > 0
                && rounds % self.config.snapshot_revert_interval == 0
            {
                self.revert_to_snapshot();
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    /// Builds the report of the session so far.
    pub fn report(&self, elapsed: Duration, terminated: bool) -> FuzzReport {
        let mut results = self.results.clone();
        let mut coverage = BTreeMap::new();
        for (name, deployed) in self.contracts.iter() {
            let Ok(artifact) = self.project.artifact(name) else { continue };
            let summary = self.coverage.summary(&deployed.addresses, artifact.runtime_code());
            if results.contains_key(name) {
                results.annotate(name, "covered", summary.to_string());
            }
            coverage.insert(name.clone(), summary);
        }

        FuzzReport {
            results,
            coverage,
            statistics: self.stats.report(),
            corpus: self.corpus.sizes(),
            transactions: self.tx_count,
            elapsed,
            terminated,
        }
    }
}

/// Loads the project described by the metadata file at `metadata` and fuzzes it on `backend`.
pub fn run_campaign<B: ExecutionBackend>(
    metadata: impl AsRef<Path>,
    config: FuzzConfig,
    backend: B,
) -> Result<FuzzReport> {
    let project = Project::load(metadata)?;
    let mut session = FuzzSession::new(project, config, backend)?;
    Ok(session.run()?)
}
