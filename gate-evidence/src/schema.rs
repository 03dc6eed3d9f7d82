//! Evidence schema, version `"2.1"`.
//!
//! Everything here is persisted JSON; field names are the wire
//! format. Maps are `BTreeMap` so serialization order is stable.

use std::collections::BTreeMap;

use gate_core::{GateStage, Severity};
use serde::{Deserialize, Serialize};

pub const EVIDENCE_SCHEMA_VERSION: &str = "2.1";
pub const EVIDENCE_FILE_NAME: &str = ".ai_evidence.json";

/// Persisted audit outcome. The live ALLOW decision is recorded as
/// PASS; WARN and BLOCK map onto themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EvidenceOutcome {
    Pass,
    Warn,
    Block,
}

/// One run's audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub version: String,
    pub timestamp: String,
    pub snapshot: Snapshot,
    pub ledger: Vec<LedgerEntry>,
    pub platforms: BTreeMap<String, PlatformState>,
    pub rulesets: Vec<RulesetStateEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tdd_bdd: Option<TddBddSnapshot>,
    pub severity_metrics: SeverityMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub stage: GateStage,
    pub outcome: EvidenceOutcome,
    pub files_scanned: u32,
    pub files_affected: u32,
    pub evaluation_metrics: EvaluationMetrics,
    pub rules_coverage: RulesCoverage,
    pub findings: Vec<SnapshotFinding>,
}

/// A finding as persisted: path normalized repo-relative, lines
/// deduped ascending, `file` is `"unknown"` for non-localized
/// findings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotFinding {
    pub rule_id: String,
    pub severity: Severity,
    pub code: String,
    pub message: String,
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<u32>>,
}

/// Per-finding history entry carried forward across runs: the chain
/// the ledger name refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub rule_id: String,
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<u32>>,
    pub first_seen: String,
    pub last_seen: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlatformState {
    pub detected: bool,
    pub confidence: f64,
}

/// One active rule source and its content fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesetStateEntry {
    pub platform: String,
    pub bundle: String,
    pub hash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeverityCounts {
    #[serde(rename = "CRITICAL")]
    pub critical: u32,
    #[serde(rename = "ERROR")]
    pub error: u32,
    #[serde(rename = "WARN")]
    pub warn: u32,
    #[serde(rename = "INFO")]
    pub info: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityMetrics {
    pub gate_status: String,
    pub total_violations: u32,
    pub by_severity: SeverityCounts,
}

/// How the rule inventory broke down for this run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub facts_total: u32,
    pub rules_total: u32,
    pub baseline_rules: u32,
    pub heuristic_rules: u32,
    pub bundle_rules: u32,
    pub project_rules: u32,
    pub matched_rules: u32,
    pub unmatched_rules: u32,
}

/// Which rules were exercised, persisted for audit diffing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RulesCoverage {
    pub active_rule_ids: Vec<String>,
    pub evaluated_rule_ids: Vec<String>,
    pub matched_rule_ids: Vec<String>,
    pub unevaluated_rule_ids: Vec<String>,
    pub coverage_ratio: f64,
}

/// TDD/BDD enforcement snapshot, embedded per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TddBddSnapshot {
    pub status: TddBddStatus,
    pub scope: TddBddScope,
    pub evidence: TddBddEvidenceState,
    pub waiver: TddBddWaiverState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TddBddStatus {
    Skipped,
    Passed,
    Waived,
    Blocked,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TddBddScope {
    pub in_scope: bool,
    pub is_new_feature: bool,
    pub is_complex_change: bool,
    pub reasons: Vec<String>,
    pub metrics: TddBddScopeMetrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TddBddScopeMetrics {
    pub changed_files: u32,
    pub estimated_loc: u32,
    pub critical_path_files: u32,
    pub public_interface_files: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TddBddEvidenceState {
    pub path: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub slices_total: u32,
    pub slices_valid: u32,
    pub slices_invalid: u32,
    pub integrity_ok: bool,
    pub errors: Vec<String>,
}

impl Default for TddBddEvidenceState {
    fn default() -> Self {
        Self {
            path: String::new(),
            state: "not_required".to_string(),
            version: None,
            slices_total: 0,
            slices_valid: 0,
            slices_invalid: 0,
            integrity_ok: true,
            errors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TddBddWaiverState {
    pub applied: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approver: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid_reason: Option<String>,
}
