//! Version control errors.

/// Errors that can occur while talking to the `git` binary.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("Failed to spawn git: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("git {command} exited with status {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },

    #[error("git produced non-UTF-8 output for {command}")]
    NonUtf8Output { command: String },

    #[error("Not inside a git repository")]
    NotARepository,

    #[error("Unable to resolve comparison ref: {0}")]
    UnresolvedRef(String),
}
