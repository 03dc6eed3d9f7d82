//! Top-level gate run errors.
//! Aggregates subsystem errors via `From` conversions.

use super::{ConfigError, EvidenceError, GitError};

/// Errors that can abort a gate run.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("Evidence error: {0}")]
    Evidence(#[from] EvidenceError),

    #[error("Invalid parameter {name}: {message}")]
    InvalidParameter { name: String, message: String },
}
