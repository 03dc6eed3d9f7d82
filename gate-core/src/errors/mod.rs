//! Error handling for changegate.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.

pub mod config_error;
pub mod evidence_error;
pub mod gate_error;
pub mod git_error;

pub use config_error::ConfigError;
pub use evidence_error::EvidenceError;
pub use gate_error::GateError;
pub use git_error::GitError;
