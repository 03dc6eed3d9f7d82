//! The on-disk TDD/BDD evidence contract: versioned RED, GREEN,
//! REFACTOR slice records.

use std::path::Path;

use serde::Deserialize;

pub const TDD_EVIDENCE_FILE: &str = ".tdd_evidence.json";
pub const TDD_EVIDENCE_VERSION: &str = "1";

#[derive(Debug, Clone, Deserialize)]
pub struct TddEvidence {
    pub version: String,
    #[serde(default)]
    pub slices: Vec<Slice>,
}

/// One vertical slice, referencing a real scenario file.
#[derive(Debug, Clone, Deserialize)]
pub struct Slice {
    pub id: String,
    pub scenario_ref: String,
    pub red: Phase,
    pub green: Phase,
    pub refactor: Phase,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Phase {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// What the contract read produced. All shapes are terminal; reading
/// never aborts enforcement.
#[derive(Debug, Clone)]
pub enum EvidenceRead {
    Missing {
        path: String,
    },
    Invalid {
        path: String,
        reason: String,
        version: Option<String>,
    },
    Valid {
        path: String,
        evidence: TddEvidence,
    },
}

/// Read `.tdd_evidence.json` from the repo root.
pub fn read_tdd_evidence(repo_root: &Path) -> EvidenceRead {
    let path = repo_root.join(TDD_EVIDENCE_FILE);
    let display_path = path.display().to_string();
    if !path.exists() {
        return EvidenceRead::Missing { path: display_path };
    }
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(error) => {
            return EvidenceRead::Invalid {
                path: display_path,
                reason: format!("unreadable: {error}"),
                version: None,
            }
        }
    };
    let evidence: TddEvidence = match serde_json::from_str(&raw) {
        Ok(evidence) => evidence,
        Err(error) => {
            return EvidenceRead::Invalid {
                path: display_path,
                reason: format!("malformed: {error}"),
                version: None,
            }
        }
    };
    if evidence.version != TDD_EVIDENCE_VERSION {
        let version = evidence.version.clone();
        return EvidenceRead::Invalid {
            path: display_path,
            reason: format!("unsupported version {version:?}"),
            version: Some(version),
        };
    }
    EvidenceRead::Valid {
        path: display_path,
        evidence,
    }
}

/// Strip a `:line` or `#anchor` suffix from a scenario reference,
/// leaving the feature file path.
pub fn scenario_feature_path(scenario_ref: &str) -> String {
    let without_anchor = scenario_ref
        .split_once('#')
        .map(|(path, _)| path)
        .unwrap_or(scenario_ref);
    if let Some((path, suffix)) = without_anchor.rsplit_once(':') {
        if !path.is_empty() && !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()) {
            return path.trim().to_string();
        }
    }
    without_anchor.trim().to_string()
}
