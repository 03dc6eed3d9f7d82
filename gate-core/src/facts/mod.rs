//! Facts — typed, immutable observations about one change set.
//!
//! Facts are produced by collaborators (the git layer, external
//! heuristic analyzers) and consumed read-only by the evaluator.

use serde::{Deserialize, Serialize};

use crate::rules::Severity;

/// How a file entered the observed diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Modified,
    Deleted,
}

/// One observation about the change set.
///
/// `source` is a free-form provenance tag (`git:staged`,
/// `git:range:main..HEAD`, `heuristics:ast`) carried through to the
/// evidence record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Fact {
    /// A file was added, modified or deleted in the observed diff.
    FileChange {
        path: String,
        change_type: ChangeType,
        source: String,
    },
    /// Full text of a non-deleted changed file.
    FileContent {
        path: String,
        content: String,
        source: String,
    },
    /// A pre-located detection produced by an external analyzer.
    /// The analyzer supplies severity, code, message and location;
    /// the engine never parses source itself.
    Heuristic {
        rule_id: String,
        severity: Severity,
        code: String,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        file_path: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        lines: Option<Vec<u32>>,
        source: String,
    },
}

impl Fact {
    /// Path of the fact, when it has one.
    pub fn path(&self) -> Option<&str> {
        match self {
            Fact::FileChange { path, .. } | Fact::FileContent { path, .. } => Some(path),
            Fact::Heuristic { file_path, .. } => file_path.as_deref(),
        }
    }

    /// Provenance tag of the fact.
    pub fn source(&self) -> &str {
        match self {
            Fact::FileChange { source, .. }
            | Fact::FileContent { source, .. }
            | Fact::Heuristic { source, .. } => source,
        }
    }
}
