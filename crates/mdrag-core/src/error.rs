use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("Failed to ingest {}: {message}", .path.display())]
    Ingestion { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Answer synthesis failed: {0}")]
    Synthesis(String),

    #[error("Not ready: {0}")]
    NotReady(String),
}

impl Error {
    /// Wrap a failure reported by an embedding provider, keeping its cause chain.
    pub fn embedding(err: &anyhow::Error) -> Self {
        Self::Embedding(format!("{err:#}"))
    }

    /// Wrap a failure reported by a completion provider, keeping its cause chain.
    pub fn synthesis(err: &anyhow::Error) -> Self {
        Self::Synthesis(format!("{err:#}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
