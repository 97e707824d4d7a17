//! Store error types.

use thiserror::Error;

/// Errors raised while reading a configuration file.
///
/// Loading never surfaces these to callers; they become warnings on the
/// load result.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
