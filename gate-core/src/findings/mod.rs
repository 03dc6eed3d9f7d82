//! Findings — concrete rule violations, optionally located to a
//! file and a set of 1-based lines.

use serde::{Deserialize, Serialize};

use crate::rules::Severity;

/// One rule violation. `lines`, when present, is deduplicated and
/// sorted ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub rule_id: String,
    pub severity: Severity,
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Finding {
    /// Normalize a raw line list into the finding invariant:
    /// deduplicated, ascending, empty collapses to `None`.
    pub fn normalize_lines(mut lines: Vec<u32>) -> Option<Vec<u32>> {
        lines.sort_unstable();
        lines.dedup();
        if lines.is_empty() {
            None
        } else {
            Some(lines)
        }
    }
}
