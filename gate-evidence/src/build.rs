//! Evidence record construction: dedupe and sort findings, carry the
//! ledger chain forward, and compute severity metrics.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use gate_core::{Finding, GateOutcome, GateStage, Severity};

use crate::schema::{
    EvaluationMetrics, EvidenceOutcome, EvidenceRecord, LedgerEntry, PlatformState,
    RulesCoverage, RulesetStateEntry, SeverityCounts, SeverityMetrics, Snapshot,
    SnapshotFinding, TddBddSnapshot, EVIDENCE_SCHEMA_VERSION,
};

/// Inputs for one run's evidence record.
#[derive(Debug, Clone)]
pub struct BuildEvidenceParams {
    pub stage: GateStage,
    pub outcome: GateOutcome,
    pub findings: Vec<Finding>,
    pub previous: Option<EvidenceRecord>,
    pub platforms: BTreeMap<String, PlatformState>,
    pub rulesets: Vec<RulesetStateEntry>,
    pub files_scanned: u32,
    pub files_affected: u32,
    pub evaluation_metrics: EvaluationMetrics,
    pub rules_coverage: RulesCoverage,
    pub tdd_bdd: Option<TddBddSnapshot>,
}

/// Build the evidence record for one run, timestamped now.
pub fn build_evidence(params: BuildEvidenceParams) -> EvidenceRecord {
    build_evidence_at(params, Utc::now())
}

/// Build the evidence record with an explicit clock, for tests and
/// reproducibility checks.
pub fn build_evidence_at(params: BuildEvidenceParams, now: DateTime<Utc>) -> EvidenceRecord {
    let timestamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
    let findings = normalize_findings(&params.findings);
    let outcome = to_evidence_outcome(params.outcome);
    let gate_status = match outcome {
        EvidenceOutcome::Block => "BLOCKED",
        EvidenceOutcome::Pass | EvidenceOutcome::Warn => "ALLOWED",
    };

    EvidenceRecord {
        version: EVIDENCE_SCHEMA_VERSION.to_string(),
        timestamp: timestamp.clone(),
        ledger: carry_ledger(&findings, params.previous.as_ref(), &timestamp),
        severity_metrics: SeverityMetrics {
            gate_status: gate_status.to_string(),
            total_violations: findings.len() as u32,
            by_severity: count_by_severity(&findings),
        },
        snapshot: Snapshot {
            stage: params.stage,
            outcome,
            files_scanned: params.files_scanned,
            files_affected: params.files_affected,
            evaluation_metrics: params.evaluation_metrics,
            rules_coverage: params.rules_coverage,
            findings,
        },
        platforms: params.platforms,
        rulesets: dedupe_rulesets(params.rulesets),
        tdd_bdd: params.tdd_bdd,
    }
}

fn to_evidence_outcome(outcome: GateOutcome) -> EvidenceOutcome {
    match outcome {
        GateOutcome::Allow => EvidenceOutcome::Pass,
        GateOutcome::Warn => EvidenceOutcome::Warn,
        GateOutcome::Block => EvidenceOutcome::Block,
    }
}

fn finding_key(finding: &SnapshotFinding) -> String {
    entry_key(&finding.rule_id, &finding.file, finding.lines.as_deref())
}

fn entry_key(rule_id: &str, file: &str, lines: Option<&[u32]>) -> String {
    let lines_key = lines
        .map(|lines| {
            lines
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(",")
        })
        .unwrap_or_default();
    format!("{rule_id}::{file}::{lines_key}")
}

/// Normalize, dedupe by `rule::file::lines` and sort findings into
/// their persisted form.
fn normalize_findings(findings: &[Finding]) -> Vec<SnapshotFinding> {
    let mut unique: BTreeMap<String, SnapshotFinding> = BTreeMap::new();
    for finding in findings {
        let normalized = SnapshotFinding {
            rule_id: finding.rule_id.clone(),
            severity: finding.severity,
            code: finding.code.clone(),
            message: finding.message.clone(),
            file: finding
                .file_path
                .as_deref()
                .map(|path| path.replace('\\', "/"))
                .unwrap_or_else(|| "unknown".to_string()),
            lines: finding
                .lines
                .clone()
                .and_then(Finding::normalize_lines),
        };
        unique.entry(finding_key(&normalized)).or_insert(normalized);
    }
    unique.into_values().collect()
}

fn count_by_severity(findings: &[SnapshotFinding]) -> SeverityCounts {
    let mut counts = SeverityCounts::default();
    for finding in findings {
        match finding.severity {
            Severity::Critical => counts.critical += 1,
            Severity::Error => counts.error += 1,
            Severity::Warn => counts.warn += 1,
            Severity::Info => counts.info += 1,
        }
    }
    counts
}

/// Carry `first_seen` forward from the previous record for findings
/// that persist across runs; new findings start their chain now.
fn carry_ledger(
    findings: &[SnapshotFinding],
    previous: Option<&EvidenceRecord>,
    now: &str,
) -> Vec<LedgerEntry> {
    let prior: BTreeMap<String, &LedgerEntry> = previous
        .map(|record| {
            record
                .ledger
                .iter()
                .map(|entry| {
                    (
                        entry_key(&entry.rule_id, &entry.file, entry.lines.as_deref()),
                        entry,
                    )
                })
                .collect()
        })
        .unwrap_or_default();

    findings
        .iter()
        .map(|finding| {
            let key = finding_key(finding);
            LedgerEntry {
                rule_id: finding.rule_id.clone(),
                file: finding.file.clone(),
                lines: finding.lines.clone(),
                first_seen: prior
                    .get(&key)
                    .map(|entry| entry.first_seen.clone())
                    .unwrap_or_else(|| now.to_string()),
                last_seen: now.to_string(),
            }
        })
        .collect()
}

fn dedupe_rulesets(rulesets: Vec<RulesetStateEntry>) -> Vec<RulesetStateEntry> {
    let mut unique: BTreeMap<(String, String), RulesetStateEntry> = BTreeMap::new();
    for entry in rulesets {
        unique
            .entry((entry.platform.clone(), entry.bundle.clone()))
            .or_insert(entry);
    }
    unique.into_values().collect()
}
