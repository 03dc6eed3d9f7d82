//! Comparison-ref resolution for the range-scoped stages.
//!
//! Pre-push compares against the branch upstream; CI walks a chain of
//! candidates derived from the hosting environment. An unusable ref
//! fails safe: the caller gets an error naming what was tried instead
//! of a silently empty diff.

use std::path::Path;

use gate_core::GitError;
use tracing::debug;

use crate::command::{run_git, run_git_optional};

/// A resolved comparison range, `from..to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRange {
    pub from_ref: String,
    pub to_ref: String,
}

fn ref_exists(repo_root: &Path, candidate: &str) -> bool {
    run_git_optional(repo_root, &["rev-parse", "--verify", "--quiet", candidate]).is_some()
}

/// Resolve the pre-push range: the configured upstream (`@{u}`)
/// against `HEAD`.
pub fn resolve_pre_push_range(repo_root: &Path) -> Result<ComparisonRange, GitError> {
    let upstream = run_git(
        repo_root,
        &["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"],
    )
    .map_err(|_| {
        GitError::UnresolvedRef(
            "no upstream configured for the current branch; \
             set one with `git branch --set-upstream-to`"
                .to_string(),
        )
    })?;
    let upstream = upstream.trim().to_string();
    if upstream.is_empty() {
        return Err(GitError::UnresolvedRef(
            "upstream resolution produced an empty ref".to_string(),
        ));
    }
    debug!(%upstream, "resolved pre-push upstream");
    Ok(ComparisonRange {
        from_ref: upstream,
        to_ref: "HEAD".to_string(),
    })
}

/// Resolve the CI range from the hosting environment.
///
/// Candidate order when a base branch is advertised (for example
/// `GITHUB_BASE_REF` on a pull request): `origin/<base>`, then
/// `<base>`. Without a base branch the previous commit is compared,
/// so push builds still gate the new commits.
pub fn resolve_ci_range(
    repo_root: &Path,
    base_branch: Option<&str>,
) -> Result<ComparisonRange, GitError> {
    if let Some(base) = base_branch.map(str::trim).filter(|base| !base.is_empty()) {
        for candidate in [format!("origin/{base}"), base.to_string()] {
            if ref_exists(repo_root, &candidate) {
                debug!(%candidate, "resolved CI base ref");
                return Ok(ComparisonRange {
                    from_ref: candidate,
                    to_ref: "HEAD".to_string(),
                });
            }
        }
        return Err(GitError::UnresolvedRef(format!(
            "base branch {base:?} not found locally or on origin; \
             fetch the base branch before running the gate"
        )));
    }

    if ref_exists(repo_root, "HEAD~1") {
        return Ok(ComparisonRange {
            from_ref: "HEAD~1".to_string(),
            to_ref: "HEAD".to_string(),
        });
    }
    Err(GitError::UnresolvedRef(
        "no base branch advertised and HEAD has no parent commit".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    fn git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .args(args)
            .current_dir(dir)
            .status()
            .unwrap();
        assert!(status.success(), "git {args:?} failed");
    }

    fn init_repo(dir: &Path) {
        git(dir, &["init", "--quiet", "--initial-branch=main"]);
        git(dir, &["config", "user.email", "test@example.com"]);
        git(dir, &["config", "user.name", "Test"]);
    }

    fn commit(dir: &Path, file: &str, content: &str, message: &str) {
        std::fs::write(dir.join(file), content).unwrap();
        git(dir, &["add", file]);
        git(dir, &["commit", "--quiet", "-m", message]);
    }

    #[test]
    fn pre_push_without_upstream_fails_safe() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        commit(dir.path(), "a.txt", "a", "first");
        let error = resolve_pre_push_range(dir.path()).unwrap_err();
        assert!(matches!(error, GitError::UnresolvedRef(_)));
    }

    #[test]
    fn ci_prefers_the_advertised_base_branch() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        commit(dir.path(), "a.txt", "a", "first");
        git(dir.path(), &["branch", "develop"]);
        commit(dir.path(), "b.txt", "b", "second");

        let range = resolve_ci_range(dir.path(), Some("develop")).unwrap();
        assert_eq!(range.from_ref, "develop");
        assert_eq!(range.to_ref, "HEAD");
    }

    #[test]
    fn ci_without_a_base_compares_the_previous_commit() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        commit(dir.path(), "a.txt", "a", "first");
        commit(dir.path(), "b.txt", "b", "second");

        let range = resolve_ci_range(dir.path(), None).unwrap();
        assert_eq!(range.from_ref, "HEAD~1");
    }

    #[test]
    fn ci_with_a_missing_base_fails_safe() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        commit(dir.path(), "a.txt", "a", "first");
        let error = resolve_ci_range(dir.path(), Some("does-not-exist")).unwrap_err();
        assert!(matches!(error, GitError::UnresolvedRef(_)));
    }
}
