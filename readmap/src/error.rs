use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the read mapping pipeline.
#[derive(Debug, Error)]
pub enum AlignError {
    /// The index rejected its argument vector, or an option could not be interpreted.
    #[error("invalid index configuration: {0:#}")]
    Config(anyhow::Error),

    /// A failure reported by the index itself, passed through unchanged.
    #[error(transparent)]
    Index(anyhow::Error),

    /// An answer arrived for a read that was never queried, or was already answered.
    #[error("received an answer for unknown read id: {0}")]
    UnknownReadId(String),

    /// The answer stream ended while queried reads were still waiting.
    #[error("index stopped answering with {count} read(s) still in flight")]
    MissingAnswers { count: usize },

    #[error("duplicate read id: {0}")]
    DuplicateReadId(String),

    #[error("read {0} already carries alignment data")]
    AlreadyAligned(String),

    #[error("cannot open debug log {}: {source}", .path.display())]
    DebugLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}
