//! Lenient evidence reads. History is advisory: a prior record that
//! cannot be used degrades to "no history", never to a failed run.

use std::path::Path;

use tracing::debug;

use crate::schema::{EvidenceRecord, EVIDENCE_FILE_NAME, EVIDENCE_SCHEMA_VERSION};

/// Load the previous run's evidence record, if a usable one exists.
///
/// Missing file, unreadable bytes, invalid JSON, or a schema version
/// other than `"2.1"` all yield `None`.
pub fn load_previous_evidence(repo_root: &Path) -> Option<EvidenceRecord> {
    let path = repo_root.join(EVIDENCE_FILE_NAME);
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(error) => {
            debug!(path = %path.display(), %error, "no previous evidence");
            return None;
        }
    };
    let record: EvidenceRecord = match serde_json::from_str(&raw) {
        Ok(record) => record,
        Err(error) => {
            debug!(path = %path.display(), %error, "previous evidence unreadable, ignoring");
            return None;
        }
    };
    if record.version != EVIDENCE_SCHEMA_VERSION {
        debug!(
            version = %record.version,
            "previous evidence has a different schema version, ignoring"
        );
        return None;
    }
    Some(record)
}
