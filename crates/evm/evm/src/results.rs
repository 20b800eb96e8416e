//! Findings of a session.

use serde::Serialize;
use std::{collections::BTreeMap, fmt, ops::Deref};

/// A finding recorded for a method.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Finding {
    /// An invariant probe returned something else than `true`.
    PropertyViolation,
    /// An invariant probe reverted.
    RevertInProbe,
    /// An arithmetic instruction wrapped.
    Overflow,
    /// The invalid instruction was executed.
    AssertionFailure,
}

impl Finding {
    /// The key the finding is recorded under for `method`.
    pub fn key(&self, method: &str) -> String {
        format!("{method}: {self}")
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PropertyViolation => "Property violation",
            Self::RevertInProbe => "Revert in fuzz function",
            Self::Overflow => "Overflow",
            Self::AssertionFailure => "AssertionFailure",
        })
    }
}

/// Findings by contract, then by finding key, with a detail string.
///
/// Every contract a transaction was generated for has an entry, possibly empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FuzzResults(BTreeMap<String, BTreeMap<String, String>>);

impl FuzzResults {
    /// Makes sure `contract` has an entry.
    pub fn touch(&mut self, contract: &str) {
        if !self.0.contains_key(contract) {
            self.0.insert(contract.to_string(), BTreeMap::new());
        }
    }

    /// Records `finding` of `contract.method`, replacing an earlier detail.
    pub fn record(&mut self, contract: &str, method: &str, finding: &Finding, detail: String) {
        let key = finding.key(method);
        debug!(target: "heuristics", contract, %key, %detail, "recorded finding");
        self.0.entry(contract.to_string()).or_default().insert(key, detail);
    }

    /// Sets an entry of `contract` that is not a finding, such as its coverage.
    pub fn annotate(&mut self, contract: &str, key: &str, value: String) {
        self.0.entry(contract.to_string()).or_default().insert(key.to_string(), value);
    }

    /// Returns the detail of `finding` for `contract.method`.
    pub fn get(&self, contract: &str, method: &str, finding: &Finding) -> Option<&str> {
        self.0.get(contract)?.get(&finding.key(method)).map(String::as_str)
    }

    pub fn into_inner(self) -> BTreeMap<String, BTreeMap<String, String>> {
        self.0
    }
}

impl Deref for FuzzResults {
    type Target = BTreeMap<String, BTreeMap<String, String>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
