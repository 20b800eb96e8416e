//! Per method failure statistics and the transaction pacing counter.

use serde::Serialize;
use std::{collections::BTreeMap, fmt};

/// Outcomes of the transactions sent to one method.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MethodStats {
    pub failed: u64,
    pub total: u64,
}

impl MethodStats {
    /// Share of failed transactions in percent.
    pub fn failure_rate(&self) -> f64 {
        if self.total == 0 { 0.0 } else { self.failed as f64 * 100.0 / self.total as f64 }
    }
}

impl fmt::Display for MethodStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Failed: {}/{}. (failure rate: {:.2}%)",
            self.failed,
            self.total,
            self.failure_rate()
        )
    }
}

/// Statistics of a session.
#[derive(Clone, Debug, Default)]
pub struct FuzzStatistics {
    methods: BTreeMap<String, BTreeMap<String, MethodStats>>,
    /// Transactions since the last reset of the pacing counter.
    since_reset: u64,
}

impl FuzzStatistics {
    /// Counts a transaction sent to `contract.method`.
    pub fn record_outcome(&mut self, contract: &str, method: &str, failed: bool) {
        let stats = self
            .methods
            .entry(contract.to_string())
            .or_default()
            .entry(method.to_string())
            .or_default();
        stats.total += 1;
        if failed {
            stats.failed += 1;
        }
        self.since_reset += 1;
    }

    /// Counts a transaction without recording its outcome.
    pub fn increment(&mut self) {
        self.since_reset += 1;
    }

    pub fn since_reset(&self) -> u64 {
        self.since_reset
    }

    pub fn reset_counter(&mut self) {
        self.since_reset = 0;
    }

    pub fn get(&self, contract: &str, method: &str) -> Option<MethodStats> {
        self.methods.get(contract)?.get(method).copied()
    }

    /// Formats the statistics of every method, keyed by contract and method.
    pub fn report(&self) -> BTreeMap<String, BTreeMap<String, String>> {
        self.methods
            .iter()
            .map(|(contract, methods)| {
                let methods =
                    methods.iter().map(|(method, stats)| (method.clone(), stats.to_string()));
                (contract.clone(), methods.collect())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_failures_and_totals() {
        let mut stats = FuzzStatistics::default();
        stats.record_outcome("Token", "transfer", true);
        stats.record_outcome("Token", "transfer", false);
        stats.record_outcome("Token", "transfer", false);
        stats.record_outcome("Token", "mint", false);
        stats.increment();

        assert_eq!(stats.get("Token", "transfer"), Some(MethodStats { failed: 1, total: 3 }));
        assert_eq!(stats.get("Token", "mint"), Some(MethodStats { failed: 0, total: 1 }));
        assert_eq!(stats.get("Token", "burn"), None);
        assert_eq!(stats.since_reset(), 5);

        stats.reset_counter();
        assert_eq!(stats.since_reset(), 0);
        assert_eq!(stats.get("Token", "transfer").unwrap().total, 3);
    }

    #[test]
    fn formats_report() {
        let mut stats = FuzzStatistics::default();
        stats.record_outcome("Token", "transfer", true);
        stats.record_outcome("Token", "transfer", false);
        stats.record_outcome("Token", "transfer", false);
        assert_eq!(
            stats.report()["Token"]["transfer"],
            "Failed: 1/3. (failure rate: 33.33%)"
        );
        assert_eq!(MethodStats::default().to_string(), "Failed: 0/0. (failure rate: 0.00%)");
    }
}
