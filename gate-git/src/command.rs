//! Child-process plumbing for git.

use std::path::Path;
use std::process::Command;

use gate_core::GitError;
use tracing::trace;

/// Run `git <args>` in `cwd` and return stdout as UTF-8.
///
/// A non-zero exit status becomes [`GitError::CommandFailed`] with the
/// command line and captured stderr, so callers never have to
/// reconstruct what was invoked.
pub fn run_git(cwd: &Path, args: &[&str]) -> Result<String, GitError> {
    trace!(?args, cwd = %cwd.display(), "running git");
    let output = Command::new("git").args(args).current_dir(cwd).output()?;
    let command = format!("git {}", args.join(" "));

    if !output.status.success() {
        return Err(GitError::CommandFailed {
            command,
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    String::from_utf8(output.stdout).map_err(|_| GitError::NonUtf8Output { command })
}

/// Like [`run_git`] but swallows failures into `None`. For probes
/// where a missing ref or config is an answer, not an error.
pub fn run_git_optional(cwd: &Path, args: &[&str]) -> Option<String> {
    run_git(cwd, args).ok()
}
