//! Evidence persistence: normalize paths repo-relative and write the
//! whole record once, after all analysis has completed.

use std::path::Path;

use gate_core::EvidenceError;

use crate::schema::{EvidenceRecord, EVIDENCE_FILE_NAME};

/// Write the record to `.ai_evidence.json` under `repo_root`.
///
/// Finding and ledger paths that are absolute under the repo root are
/// rewritten repo-relative so the record is stable across checkouts.
/// The file is written in full, exactly once; there is no partial
/// write path.
pub fn write_evidence(record: &EvidenceRecord, repo_root: &Path) -> Result<(), EvidenceError> {
    let path = repo_root.join(EVIDENCE_FILE_NAME);
    let mut stable = record.clone();

    for finding in &mut stable.snapshot.findings {
        finding.file = to_repo_relative(&finding.file, repo_root);
    }
    for entry in &mut stable.ledger {
        entry.file = to_repo_relative(&entry.file, repo_root);
    }

    let mut rendered = serde_json::to_string_pretty(&stable)?;
    rendered.push('\n');
    std::fs::write(&path, rendered).map_err(|source| EvidenceError::Write { path, source })
}

fn to_repo_relative(file: &str, repo_root: &Path) -> String {
    let normalized = file.replace('\\', "/");
    let candidate = Path::new(&normalized);
    if !candidate.is_absolute() {
        return normalized;
    }
    match candidate.strip_prefix(repo_root) {
        Ok(relative) if !relative.as_os_str().is_empty() => {
            relative.to_string_lossy().replace('\\', "/")
        }
        _ => normalized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{build_evidence_at, BuildEvidenceParams};
    use crate::load::load_previous_evidence;
    use crate::schema::{EvaluationMetrics, RulesCoverage};
    use chrono::{TimeZone, Utc};
    use gate_core::{Finding, GateOutcome, GateStage, Severity};
    use std::collections::BTreeMap;

    fn record_with_finding(file_path: &str) -> crate::schema::EvidenceRecord {
        build_evidence_at(
            BuildEvidenceParams {
                stage: GateStage::Ci,
                outcome: GateOutcome::Warn,
                findings: vec![Finding {
                    rule_id: "a.rule".to_string(),
                    severity: Severity::Warn,
                    code: "A_RULE".to_string(),
                    message: "matched".to_string(),
                    file_path: Some(file_path.to_string()),
                    lines: Some(vec![3, 1]),
                    matched_by: None,
                    source: None,
                }],
                previous: None,
                platforms: BTreeMap::new(),
                rulesets: Vec::new(),
                files_scanned: 1,
                files_affected: 1,
                evaluation_metrics: EvaluationMetrics::default(),
                rules_coverage: RulesCoverage::default(),
                tdd_bdd: None,
            },
            Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn round_trips_through_the_evidence_file() {
        let dir = tempfile::tempdir().unwrap();
        let record = record_with_finding("src/app.ts");
        write_evidence(&record, dir.path()).unwrap();
        let loaded = load_previous_evidence(dir.path()).unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn absolute_paths_under_root_become_relative() {
        let dir = tempfile::tempdir().unwrap();
        let absolute = dir.path().join("src/app.ts");
        let record = record_with_finding(&absolute.to_string_lossy());
        write_evidence(&record, dir.path()).unwrap();
        let loaded = load_previous_evidence(dir.path()).unwrap();
        assert_eq!(loaded.snapshot.findings[0].file, "src/app.ts");
        assert_eq!(loaded.ledger[0].file, "src/app.ts");
    }
}
