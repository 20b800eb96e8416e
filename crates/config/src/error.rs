//! Errors raised while extracting the fuzzer configuration.

use figment::providers::{Format, Toml};
use std::{collections::HashSet, error::Error, fmt};

/// The message shown when the config could not be extracted from the figment.
pub const FAILED_TO_EXTRACT_CONFIG_MSG: &str = "failed to extract chainfuzz config:";

/// Represents a failed attempt to extract [`FuzzConfig`](crate::FuzzConfig) from a `Figment`.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractConfigError {
    /// error thrown when extracting the config
    pub(crate) error: figment::Error,
}

impl ExtractConfigError {
    /// Wraps the figment error
    pub fn new(error: figment::Error) -> Self {
        Self { error }
    }
}

impl fmt::Display for ExtractConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut unique_errors = Vec::with_capacity(self.error.count());
        let mut unique = HashSet::with_capacity(self.error.count());
        for err in self.error.clone() {
            let err = if err
                .metadata
                .as_ref()
                .map(|meta| meta.name.contains(Toml::NAME))
                .unwrap_or_default()
            {
                ConfigSourceError::Toml(err)
            } else {
                ConfigSourceError::Other(err)
            };

            if unique.insert(err.to_string()) {
                unique_errors.push(err);
            }
        }
        writeln!(f, "{FAILED_TO_EXTRACT_CONFIG_MSG}")?;
        for err in unique_errors {
            writeln!(f, "{err}")?;
        }
        Ok(())
    }
}

impl Error for ExtractConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Error::source(&self.error)
    }
}

/// A single figment error, tagged with the provider it came from.
#[derive(Clone, Debug, PartialEq)]
enum ConfigSourceError {
    /// An error thrown during toml parsing
    Toml(figment::Error),
    /// Any other error thrown when constructing the config's figment
    Other(figment::Error),
}

impl fmt::Display for ConfigSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fmt_err = |err: &figment::Error, f: &mut fmt::Formatter<'_>| {
            write!(f, "{err}")?;
            if !err.path.is_empty() {
                // the path will contain the setting value like `["corpus", "random_words"]`
                write!(f, " for setting `{}`", err.path.join("."))?;
            }
            Ok(())
        };

        match self {
            Self::Toml(err) => {
                f.write_str("chainfuzz.toml error: ")?;
                fmt_err(err, f)
            }
            Self::Other(err) => {
                f.write_str("chainfuzz config error: ")?;
                fmt_err(err, f)
            }
        }
    }
}
