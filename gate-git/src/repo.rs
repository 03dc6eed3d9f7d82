//! The live repository collaborator: fact collection and history
//! capture over a real working tree.

use std::path::{Path, PathBuf};

use gate_core::{ChangeType, Fact, GitError};
use gate_engine::hotspots::HistorySource;
use gate_engine::GitFacts;
use tracing::{debug, warn};

use crate::command::{run_git, run_git_optional};
use crate::diff::{filter_by_extension, parse_name_status};

const DEFAULT_MAX_CONTENT_BYTES: u64 = 1_048_576;

/// Handle to one git repository.
pub struct GitRepo {
    root: PathBuf,
    max_content_bytes: u64,
}

impl GitRepo {
    /// Discover the repository containing `cwd`.
    pub fn discover(cwd: &Path) -> Result<Self, GitError> {
        let output = run_git(cwd, &["rev-parse", "--show-toplevel"])
            .map_err(|_| GitError::NotARepository)?;
        let root = PathBuf::from(output.trim());
        if root.as_os_str().is_empty() {
            return Err(GitError::NotARepository);
        }
        Ok(Self {
            root,
            max_content_bytes: DEFAULT_MAX_CONTENT_BYTES,
        })
    }

    /// Cap on file contents loaded into `FileContent` facts. Larger
    /// files keep their change fact but skip content scanning.
    pub fn with_max_content_bytes(mut self, max_content_bytes: u64) -> Self {
        self.max_content_bytes = max_content_bytes;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn content_fact(&self, spec: &str, path: &str, source: &str) -> Option<Fact> {
        let content = run_git_optional(&self.root, &["show", spec])?;
        if content.len() as u64 > self.max_content_bytes {
            warn!(path, bytes = content.len(), "skipping oversized file content");
            return None;
        }
        Some(Fact::FileContent {
            path: path.to_string(),
            content,
            source: source.to_string(),
        })
    }

    fn facts_from_diff(
        &self,
        diff_args: &[&str],
        content_ref: Option<&str>,
        extensions: &[String],
        source: &str,
    ) -> Result<Vec<Fact>, GitError> {
        let output = run_git(&self.root, diff_args)?;
        let entries = filter_by_extension(parse_name_status(&output), extensions);
        debug!(files = entries.len(), source, "collected change entries");

        let mut facts = Vec::new();
        for entry in entries {
            facts.push(Fact::FileChange {
                path: entry.path.clone(),
                change_type: entry.change_type,
                source: source.to_string(),
            });
            if entry.change_type == ChangeType::Deleted {
                continue;
            }
            let spec = match content_ref {
                Some(reference) => format!("{reference}:{}", entry.path),
                None => format!(":{}", entry.path),
            };
            if let Some(fact) = self.content_fact(&spec, &entry.path, source) {
                facts.push(fact);
            }
        }
        Ok(facts)
    }
}

impl GitFacts for GitRepo {
    fn repo_root(&self) -> Result<PathBuf, GitError> {
        Ok(self.root.clone())
    }

    fn current_branch(&self) -> Option<String> {
        let branch = run_git_optional(&self.root, &["rev-parse", "--abbrev-ref", "HEAD"])?;
        let branch = branch.trim();
        // Detached HEAD reports the literal "HEAD".
        if branch.is_empty() || branch == "HEAD" {
            return None;
        }
        Some(branch.to_string())
    }

    fn staged_facts(&self, extensions: &[String]) -> Result<Vec<Fact>, GitError> {
        self.facts_from_diff(
            &["diff", "--cached", "--name-status"],
            None,
            extensions,
            "git:staged",
        )
    }

    fn range_facts(
        &self,
        from_ref: &str,
        to_ref: &str,
        extensions: &[String],
    ) -> Result<Vec<Fact>, GitError> {
        let range = format!("{from_ref}..{to_ref}");
        self.facts_from_diff(
            &["diff", "--name-status", &range],
            Some(to_ref),
            extensions,
            &format!("git:range:{range}"),
        )
    }
}

impl HistorySource for GitRepo {
    fn history_log(&self, args: &[String]) -> Result<String, GitError> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        run_git(&self.root, &args)
    }
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

    fn stage(dir: &Path, file: &str, content: &str) {
        if let Some(parent) = dir.join(file).parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(dir.join(file), content).unwrap();
        git(dir, &["add", file]);
    }

    fn commit(dir: &Path, message: &str) {
        git(dir, &["commit", "--quiet", "-m", message]);
    }

    #[test]
    fn staged_facts_filter_by_extension_and_carry_content() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        stage(dir.path(), "src/app.ts", "console.log(\"hi\");\n");
        stage(dir.path(), "README.md", "# readme\n");

        let repo = GitRepo::discover(dir.path()).unwrap();
        let facts = repo.staged_facts(&["ts".to_string()]).unwrap();

        let paths: Vec<&str> = facts.iter().filter_map(Fact::path).collect();
        assert!(paths.iter().all(|path| path.ends_with(".ts")));
        assert!(facts.iter().any(|fact| matches!(
            fact,
            Fact::FileChange { path, change_type: ChangeType::Added, .. } if path == "src/app.ts"
        )));
        assert!(facts.iter().any(|fact| matches!(
            fact,
            Fact::FileContent { path, content, .. }
                if path == "src/app.ts" && content.contains("console.log")
        )));
        assert!(facts.iter().all(|fact| fact.source() == "git:staged"));
    }

    #[test]
    fn deleted_files_produce_a_change_fact_without_content() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        stage(dir.path(), "src/app.ts", "const x = 1;\n");
        commit(dir.path(), "add app");
        git(dir.path(), &["rm", "--quiet", "src/app.ts"]);

        let repo = GitRepo::discover(dir.path()).unwrap();
        let facts = repo.staged_facts(&[]).unwrap();

        assert!(facts.iter().any(|fact| matches!(
            fact,
            Fact::FileChange { change_type: ChangeType::Deleted, .. }
        )));
        assert!(!facts
            .iter()
            .any(|fact| matches!(fact, Fact::FileContent { .. })));
    }

    #[test]
    fn range_facts_cover_the_commits_between_two_refs() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        stage(dir.path(), "src/app.ts", "const x = 1;\n");
        commit(dir.path(), "first");
        stage(dir.path(), "src/extra.ts", "const y = 2;\n");
        commit(dir.path(), "second");

        let repo = GitRepo::discover(dir.path()).unwrap();
        let facts = repo.range_facts("HEAD~1", "HEAD", &[]).unwrap();

        let paths: Vec<&str> = facts.iter().filter_map(Fact::path).collect();
        assert!(paths.contains(&"src/extra.ts"));
        assert!(!paths.contains(&"src/app.ts"));
        assert!(facts
            .iter()
            .all(|fact| fact.source() == "git:range:HEAD~1..HEAD"));
    }

    #[test]
    fn discover_outside_a_repository_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            GitRepo::discover(dir.path()),
            Err(GitError::NotARepository)
        ));
    }

    #[test]
    fn oversized_content_keeps_the_change_fact_only() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        stage(dir.path(), "src/big.ts", &"x".repeat(256));

        let repo = GitRepo::discover(dir.path())
            .unwrap()
            .with_max_content_bytes(64);
        let facts = repo.staged_facts(&[]).unwrap();

        assert!(facts
            .iter()
            .any(|fact| matches!(fact, Fact::FileChange { .. })));
        assert!(!facts
            .iter()
            .any(|fact| matches!(fact, Fact::FileContent { .. })));
    }
}
