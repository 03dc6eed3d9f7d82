//! TDD/BDD enforcement — a sibling policy gate requiring verifiable
//! test-first evidence for in-scope changes, with an auditable waiver
//! escape hatch.

pub mod contract;
pub mod scope;
pub mod waiver;

use std::path::Path;

use chrono::{DateTime, Utc};
use gate_core::{EnforcementConfig, Fact, Finding, Severity};
use gate_evidence::schema::{
    TddBddEvidenceState, TddBddSnapshot, TddBddStatus, TddBddWaiverState,
};

use contract::{read_tdd_evidence, scenario_feature_path, EvidenceRead};
use scope::classify_tdd_bdd_scope;
use waiver::{resolve_active_waiver, WaiverResolution};

/// Enforcement output: the findings to merge into the gate run plus
/// the snapshot persisted into evidence.
#[derive(Debug, Clone)]
pub struct TddBddEnforcement {
    pub findings: Vec<Finding>,
    pub snapshot: TddBddSnapshot,
}

impl TddBddEnforcement {
    /// True when enforcement itself should block the run.
    pub fn blocked(&self) -> bool {
        self.snapshot.status == TddBddStatus::Blocked
    }
}

fn finding(rule_id: &str, code: &str, message: String, severity: Severity, file_path: Option<String>, source: &str) -> Finding {
    Finding {
        rule_id: rule_id.to_string(),
        severity,
        code: code.to_string(),
        message,
        file_path,
        lines: None,
        matched_by: Some("TddBddEnforcer".to_string()),
        source: Some(source.to_string()),
    }
}

fn blocking_finding(rule_id: &str, code: &str, message: String, file_path: Option<String>) -> Finding {
    finding(rule_id, code, message, Severity::Error, file_path, "tdd-bdd-contract")
}

fn timeline_ordered(timestamps: &[Option<&str>]) -> bool {
    let mut parsed: Vec<DateTime<Utc>> = Vec::new();
    for timestamp in timestamps {
        let Some(timestamp) = timestamp else {
            // A missing timestamp ends the comparable prefix.
            return true;
        };
        match DateTime::parse_from_rfc3339(timestamp) {
            Ok(time) => parsed.push(time.with_timezone(&Utc)),
            Err(_) => return false,
        }
    }
    parsed.windows(2).all(|pair| pair[0] <= pair[1])
}

/// Enforce the TDD/BDD policy against the change set.
pub fn enforce_tdd_bdd_policy(
    repo_root: &Path,
    branch: Option<&str>,
    facts: &[Fact],
    config: &EnforcementConfig,
) -> TddBddEnforcement {
    enforce_tdd_bdd_policy_at(repo_root, branch, facts, config, Utc::now())
}

/// Enforcement with an explicit clock, for tests.
pub fn enforce_tdd_bdd_policy_at(
    repo_root: &Path,
    branch: Option<&str>,
    facts: &[Fact],
    config: &EnforcementConfig,
    now: DateTime<Utc>,
) -> TddBddEnforcement {
    let scope = classify_tdd_bdd_scope(facts, config);
    let mut snapshot = TddBddSnapshot {
        status: TddBddStatus::Skipped,
        scope: scope.to_snapshot_scope(),
        evidence: TddBddEvidenceState::default(),
        waiver: TddBddWaiverState::default(),
    };

    if !scope.in_scope {
        return TddBddEnforcement {
            findings: Vec::new(),
            snapshot,
        };
    }

    match resolve_active_waiver(repo_root, branch, now) {
        WaiverResolution::Applied { path, waiver } => {
            let message = format!(
                "TDD/BDD waiver applied by {} until {}.",
                waiver.approved_by, waiver.expires_at
            );
            snapshot.status = TddBddStatus::Waived;
            snapshot.waiver = TddBddWaiverState {
                applied: true,
                path: Some(path.clone()),
                approver: Some(waiver.approved_by),
                reason: Some(waiver.reason),
                expires_at: Some(waiver.expires_at),
                invalid_reason: None,
            };
            return TddBddEnforcement {
                findings: vec![finding(
                    "generic_tdd_vertical_required",
                    "TDD_BDD_WAIVER_APPLIED",
                    message,
                    Severity::Info,
                    Some(path),
                    "tdd-bdd-waiver",
                )],
                snapshot,
            };
        }
        WaiverResolution::Invalid { path, reason } => {
            snapshot.waiver = TddBddWaiverState {
                applied: false,
                path: Some(path),
                invalid_reason: Some(reason),
                ..TddBddWaiverState::default()
            };
        }
        WaiverResolution::Absent => {}
    }

    match read_tdd_evidence(repo_root) {
        EvidenceRead::Missing { path } => {
            snapshot.status = TddBddStatus::Blocked;
            snapshot.evidence.path = path.clone();
            snapshot.evidence.state = "missing".to_string();
            snapshot.evidence.integrity_ok = false;
            snapshot.evidence.errors = vec!["missing_contract".to_string()];
            TddBddEnforcement {
                findings: vec![blocking_finding(
                    "generic_evidence_integrity_required",
                    "TDD_BDD_EVIDENCE_MISSING",
                    "TDD/BDD evidence contract is required for new/complex changes and was not found."
                        .to_string(),
                    Some(path),
                )],
                snapshot,
            }
        }
        EvidenceRead::Invalid {
            path,
            reason,
            version,
        } => {
            snapshot.status = TddBddStatus::Blocked;
            snapshot.evidence.path = path.clone();
            snapshot.evidence.state = "invalid".to_string();
            snapshot.evidence.version = version;
            snapshot.evidence.integrity_ok = false;
            snapshot.evidence.errors = vec![reason.clone()];
            TddBddEnforcement {
                findings: vec![blocking_finding(
                    "generic_evidence_integrity_required",
                    "TDD_BDD_EVIDENCE_INVALID",
                    format!("TDD/BDD evidence contract is invalid: {reason}."),
                    Some(path),
                )],
                snapshot,
            }
        }
        EvidenceRead::Valid { path, evidence } => {
            let mut findings = Vec::new();
            let mut seen_ids: Vec<&str> = Vec::new();
            let mut valid_slices: u32 = 0;

            if evidence.slices.is_empty() {
                findings.push(blocking_finding(
                    "generic_tdd_vertical_required",
                    "TDD_BDD_EMPTY_SLICES",
                    "Evidence contract must contain at least one vertical slice.".to_string(),
                    Some(path.clone()),
                ));
            }

            for slice in &evidence.slices {
                let errors_before = findings.len();

                if seen_ids.contains(&slice.id.as_str()) {
                    findings.push(blocking_finding(
                        "generic_tdd_vertical_required",
                        "TDD_BDD_DUPLICATE_SLICE_ID",
                        format!("Duplicate slice id detected: {}.", slice.id),
                        Some(path.clone()),
                    ));
                } else {
                    seen_ids.push(&slice.id);
                }

                let feature_path = scenario_feature_path(&slice.scenario_ref);
                if !feature_path.to_ascii_lowercase().ends_with(".feature") {
                    findings.push(blocking_finding(
                        "generic_bdd_feature_required",
                        "TDD_BDD_SCENARIO_NOT_FEATURE",
                        format!("Slice {} must reference a .feature scenario.", slice.id),
                        Some(path.clone()),
                    ));
                } else {
                    let resolved = if Path::new(&feature_path).is_absolute() {
                        Path::new(&feature_path).to_path_buf()
                    } else {
                        repo_root.join(&feature_path)
                    };
                    if !resolved.exists() {
                        findings.push(blocking_finding(
                            "generic_bdd_feature_required",
                            "TDD_BDD_SCENARIO_FILE_MISSING",
                            format!(
                                "Slice {} references missing feature file {feature_path}.",
                                slice.id
                            ),
                            Some(resolved.display().to_string()),
                        ));
                    }
                }

                if slice.red.status != "failed" {
                    findings.push(blocking_finding(
                        "generic_tdd_vertical_required",
                        "TDD_RED_MUST_FAIL",
                        format!("Slice {} must start with RED failing test evidence.", slice.id),
                        Some(path.clone()),
                    ));
                }
                if slice.green.status != "passed" || slice.refactor.status != "passed" {
                    findings.push(blocking_finding(
                        "generic_red_green_refactor_enforced",
                        "TDD_GREEN_REFACTOR_MUST_PASS",
                        format!(
                            "Slice {} must include GREEN and REFACTOR passing evidence.",
                            slice.id
                        ),
                        Some(path.clone()),
                    ));
                }
                if !timeline_ordered(&[
                    slice.red.timestamp.as_deref(),
                    slice.green.timestamp.as_deref(),
                    slice.refactor.timestamp.as_deref(),
                ]) {
                    findings.push(blocking_finding(
                        "generic_red_green_refactor_enforced",
                        "TDD_PHASE_TIMELINE_INVALID",
                        format!(
                            "Slice {} has invalid RED->GREEN->REFACTOR timestamp ordering.",
                            slice.id
                        ),
                        Some(path.clone()),
                    ));
                }

                if findings.len() == errors_before {
                    valid_slices += 1;
                }
            }

            let blocked = findings
                .iter()
                .any(|finding| finding.severity >= Severity::Error);
            snapshot.status = if blocked {
                TddBddStatus::Blocked
            } else {
                TddBddStatus::Passed
            };
            snapshot.evidence.path = path;
            snapshot.evidence.state = "valid".to_string();
            snapshot.evidence.version = Some(evidence.version.clone());
            snapshot.evidence.slices_total = evidence.slices.len() as u32;
            snapshot.evidence.slices_valid = valid_slices;
            snapshot.evidence.slices_invalid =
                (evidence.slices.len() as u32).saturating_sub(valid_slices);
            snapshot.evidence.integrity_ok = !blocked;
            snapshot.evidence.errors = findings
                .iter()
                .map(|finding| finding.code.clone())
                .collect();

            TddBddEnforcement { findings, snapshot }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gate_core::ChangeType;

    fn in_scope_facts() -> Vec<Fact> {
        vec![Fact::FileChange {
            path: "src/feature.ts".to_string(),
            change_type: ChangeType::Added,
            source: "git:staged".to_string(),
        }]
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-02T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn enforce(repo_root: &Path, facts: &[Fact]) -> TddBddEnforcement {
        enforce_tdd_bdd_policy_at(
            repo_root,
            Some("main"),
            facts,
            &EnforcementConfig::default(),
            now(),
        )
    }

    #[test]
    fn out_of_scope_change_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let facts = vec![Fact::FileChange {
            path: "docs/README.md".to_string(),
            change_type: ChangeType::Modified,
            source: "git:staged".to_string(),
        }];
        let result = enforce(dir.path(), &facts);
        assert_eq!(result.snapshot.status, TddBddStatus::Skipped);
        assert!(result.findings.is_empty());
    }

    #[test]
    fn missing_evidence_blocks_in_scope_change() {
        let dir = tempfile::tempdir().unwrap();
        let result = enforce(dir.path(), &in_scope_facts());
        assert_eq!(result.snapshot.status, TddBddStatus::Blocked);
        assert!(result.blocked());
        assert_eq!(result.findings[0].code, "TDD_BDD_EVIDENCE_MISSING");
        assert_eq!(result.findings[0].severity, Severity::Error);
    }

    #[test]
    fn valid_waiver_converts_blocked_to_waived_with_info_finding() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(waiver::WAIVER_FILE),
            r#"{"reason":"hotfix","approved_by":"lead","approved_at":"2026-03-01T00:00:00Z","expires_at":"2026-03-10T00:00:00Z"}"#,
        )
        .unwrap();
        let result = enforce(dir.path(), &in_scope_facts());
        assert_eq!(result.snapshot.status, TddBddStatus::Waived);
        assert!(!result.blocked());
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].code, "TDD_BDD_WAIVER_APPLIED");
        assert_eq!(result.findings[0].severity, Severity::Info);
        assert!(result.snapshot.waiver.applied);
    }

    #[test]
    fn complete_slice_evidence_passes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("features")).unwrap();
        std::fs::write(dir.path().join("features/login.feature"), "Feature: login\n").unwrap();
        std::fs::write(
            dir.path().join(contract::TDD_EVIDENCE_FILE),
            r#"{
              "version": "1",
              "slices": [{
                "id": "slice-1",
                "scenario_ref": "features/login.feature:3",
                "red": {"status": "failed", "timestamp": "2026-03-01T10:00:00Z"},
                "green": {"status": "passed", "timestamp": "2026-03-01T11:00:00Z"},
                "refactor": {"status": "passed", "timestamp": "2026-03-01T12:00:00Z"}
              }]
            }"#,
        )
        .unwrap();
        let result = enforce(dir.path(), &in_scope_facts());
        assert_eq!(result.snapshot.status, TddBddStatus::Passed);
        assert!(result.findings.is_empty());
        assert_eq!(result.snapshot.evidence.slices_valid, 1);
    }

    #[test]
    fn slice_referencing_missing_feature_blocks() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(contract::TDD_EVIDENCE_FILE),
            r#"{
              "version": "1",
              "slices": [{
                "id": "slice-1",
                "scenario_ref": "features/absent.feature",
                "red": {"status": "failed"},
                "green": {"status": "passed"},
                "refactor": {"status": "passed"}
              }]
            }"#,
        )
        .unwrap();
        let result = enforce(dir.path(), &in_scope_facts());
        assert_eq!(result.snapshot.status, TddBddStatus::Blocked);
        assert!(result
            .findings
            .iter()
            .any(|finding| finding.code == "TDD_BDD_SCENARIO_FILE_MISSING"));
    }

    #[test]
    fn red_phase_must_fail_first() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("features")).unwrap();
        std::fs::write(dir.path().join("features/login.feature"), "Feature: login\n").unwrap();
        std::fs::write(
            dir.path().join(contract::TDD_EVIDENCE_FILE),
            r#"{
              "version": "1",
              "slices": [{
                "id": "slice-1",
                "scenario_ref": "features/login.feature",
                "red": {"status": "passed"},
                "green": {"status": "passed"},
                "refactor": {"status": "passed"}
              }]
            }"#,
        )
        .unwrap();
        let result = enforce(dir.path(), &in_scope_facts());
        assert!(result
            .findings
            .iter()
            .any(|finding| finding.code == "TDD_RED_MUST_FAIL"));
        assert_eq!(result.snapshot.evidence.slices_invalid, 1);
    }

    #[test]
    fn out_of_order_timestamps_block() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("features")).unwrap();
        std::fs::write(dir.path().join("features/login.feature"), "Feature: login\n").unwrap();
        std::fs::write(
            dir.path().join(contract::TDD_EVIDENCE_FILE),
            r#"{
              "version": "1",
              "slices": [{
                "id": "slice-1",
                "scenario_ref": "features/login.feature",
                "red": {"status": "failed", "timestamp": "2026-03-01T12:00:00Z"},
                "green": {"status": "passed", "timestamp": "2026-03-01T10:00:00Z"},
                "refactor": {"status": "passed", "timestamp": "2026-03-01T11:00:00Z"}
              }]
            }"#,
        )
        .unwrap();
        let result = enforce(dir.path(), &in_scope_facts());
        assert!(result
            .findings
            .iter()
            .any(|finding| finding.code == "TDD_PHASE_TIMELINE_INVALID"));
    }
}
