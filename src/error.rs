use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single generation call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Backend unreachable, misconfigured or timed out.
    #[error("generation backend unavailable: {0}")]
    Unavailable(String),

    /// Backend answered with an error or an empty payload.
    #[error("generation backend rejected the request: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(String),

    #[error("invalid configuration value: {0}")]
    Invalid(String),

    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize settings for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum ExplainError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read log file {path}: {source}")]
    ReadLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("narrative generation failed for intent {intent_id}: {source}")]
    Generation {
        intent_id: String,
        #[source]
        source: GenerationError,
    },
}
