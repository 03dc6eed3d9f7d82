//! Evidence ledger errors.

use std::path::PathBuf;

/// Errors that can occur while building or persisting evidence.
/// Reading existing evidence is deliberately infallible and never
/// surfaces here.
#[derive(Debug, thiserror::Error)]
pub enum EvidenceError {
    #[error("Failed to write evidence to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize evidence: {0}")]
    Serialize(#[from] serde_json::Error),
}
