//! Error types for SARIF baselining.

use thiserror::Error;

/// Result type alias for baselining operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading logs or resolving result context.
///
/// The matching engine itself never returns these: an unresolvable location
/// only makes a comparer decline the result.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// SARIF (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file could not be parsed.
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// A location references an artifact index missing from its run.
    #[error("Artifact index {index} is outside the run's artifact table ({len} entries)")]
    UnresolvableArtifact { index: i64, len: usize },

    /// A caller-supplied value was not understood.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
