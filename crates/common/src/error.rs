//! Error types for the HAL mock test runner

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the harness Error
pub type Result<T> = std::result::Result<T, Error>;

/// Harness error types
///
/// These are failures of the harness itself. A test case whose endpoint is
/// unreachable or answers with the wrong text is a recorded `Fail`, never an
/// `Error`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Suite parse error in {path}: {reason}")]
    SuiteParse { path: PathBuf, reason: String },

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Test case not found: {0}")]
    UnknownTestCase(String),

    #[error("Test case defined twice: {0}")]
    DuplicateTestCase(String),

    #[error("Report error: {0}")]
    Report(String),
}

impl Error {
    /// Wrap a YAML failure with the suite file it came from
    pub fn suite_parse(path: impl Into<PathBuf>, err: serde_yaml::Error) -> Self {
        Error::SuiteParse {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}
