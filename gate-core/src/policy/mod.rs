//! Gate policy — per-stage thresholds and the three-state outcome
//! classification.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::findings::Finding;
use crate::hash::content_hash;
use crate::rules::Severity;

/// Pipeline stage. Each stage carries its own thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateStage {
    #[serde(rename = "PRE_COMMIT")]
    PreCommit,
    #[serde(rename = "PRE_PUSH")]
    PrePush,
    #[serde(rename = "CI")]
    Ci,
}

impl GateStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateStage::PreCommit => "PRE_COMMIT",
            GateStage::PrePush => "PRE_PUSH",
            GateStage::Ci => "CI",
        }
    }
}

impl fmt::Display for GateStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live decision of one gate evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GateOutcome {
    Allow,
    Warn,
    Block,
}

/// Stage thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GatePolicy {
    pub stage: GateStage,
    pub block_on_or_above: Severity,
    pub warn_on_or_above: Severity,
}

/// Result of `evaluate_gate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateDecision {
    pub outcome: GateOutcome,
}

/// Classify findings against a stage policy. Total and stateless:
/// one evaluation, one of three terminal outcomes.
pub fn evaluate_gate(findings: &[Finding], policy: &GatePolicy) -> GateDecision {
    let highest = findings.iter().map(|finding| finding.severity).max();
    let outcome = match highest {
        Some(severity) if severity >= policy.block_on_or_above => GateOutcome::Block,
        Some(severity) if severity >= policy.warn_on_or_above => GateOutcome::Warn,
        _ => GateOutcome::Allow,
    };
    GateDecision { outcome }
}

/// Compiled default policy per stage: pre-commit is lenient (block
/// only on CRITICAL), pre-push and CI block on ERROR.
pub fn default_policy_for_stage(stage: GateStage) -> GatePolicy {
    match stage {
        GateStage::PreCommit => GatePolicy {
            stage,
            block_on_or_above: Severity::Critical,
            warn_on_or_above: Severity::Error,
        },
        GateStage::PrePush | GateStage::Ci => GatePolicy {
            stage,
            block_on_or_above: Severity::Error,
            warn_on_or_above: Severity::Warn,
        },
    }
}

/// Where the effective policy came from, recorded into evidence so
/// the exact thresholds of every run are auditable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyTrace {
    pub source: PolicySource,
    pub bundle: String,
    pub hash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicySource {
    Default,
    ProjectPolicy,
}

/// A resolved stage policy plus its audit trace.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStagePolicy {
    pub policy: GatePolicy,
    pub trace: PolicyTrace,
}

pub const POLICY_OVERRIDE_FILE: &str = "gate.policy.json";

#[derive(Debug, Deserialize)]
struct PolicyOverrideFile {
    #[serde(default)]
    stages: BTreeMap<String, StageThresholds>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
struct StageThresholds {
    block_on_or_above: Severity,
    warn_on_or_above: Severity,
}

/// Resolve the effective policy for a stage: project override file
/// first, compiled defaults otherwise. A malformed override file
/// degrades to the defaults with a warning — never a crash.
pub fn resolve_policy_for_stage(stage: GateStage, repo_root: &Path) -> ResolvedStagePolicy {
    let override_path = repo_root.join(POLICY_OVERRIDE_FILE);
    if override_path.exists() {
        match fs::read_to_string(&override_path)
            .map_err(|error| error.to_string())
            .and_then(|raw| {
                serde_json::from_str::<PolicyOverrideFile>(&raw).map_err(|error| error.to_string())
            }) {
            Ok(overrides) => {
                if let Some(thresholds) = overrides.stages.get(stage.as_str()) {
                    let policy = GatePolicy {
                        stage,
                        block_on_or_above: thresholds.block_on_or_above,
                        warn_on_or_above: thresholds.warn_on_or_above,
                    };
                    return ResolvedStagePolicy {
                        trace: PolicyTrace {
                            source: PolicySource::ProjectPolicy,
                            bundle: format!("gate-policy.project.{stage}"),
                            hash: content_hash(&policy),
                        },
                        policy,
                    };
                }
            }
            Err(error) => {
                warn!(
                    path = %override_path.display(),
                    %error,
                    "malformed policy override, falling back to stage defaults"
                );
            }
        }
    }

    let policy = default_policy_for_stage(stage);
    ResolvedStagePolicy {
        trace: PolicyTrace {
            source: PolicySource::Default,
            bundle: format!("gate-policy.default.{stage}"),
            hash: content_hash(&policy),
        },
        policy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(severity: Severity) -> Finding {
        Finding {
            rule_id: "rule".to_string(),
            severity,
            code: "CODE".to_string(),
            message: "message".to_string(),
            file_path: None,
            lines: None,
            matched_by: None,
            source: None,
        }
    }

    #[test]
    fn no_findings_allows() {
        let policy = default_policy_for_stage(GateStage::Ci);
        assert_eq!(evaluate_gate(&[], &policy).outcome, GateOutcome::Allow);
    }

    #[test]
    fn ci_blocks_on_error_and_warns_on_warn() {
        let policy = default_policy_for_stage(GateStage::Ci);
        assert_eq!(
            evaluate_gate(&[finding(Severity::Error)], &policy).outcome,
            GateOutcome::Block
        );
        assert_eq!(
            evaluate_gate(&[finding(Severity::Warn)], &policy).outcome,
            GateOutcome::Warn
        );
        assert_eq!(
            evaluate_gate(&[finding(Severity::Info)], &policy).outcome,
            GateOutcome::Allow
        );
    }

    #[test]
    fn pre_commit_blocks_only_on_critical() {
        let policy = default_policy_for_stage(GateStage::PreCommit);
        assert_eq!(
            evaluate_gate(&[finding(Severity::Error)], &policy).outcome,
            GateOutcome::Warn
        );
        assert_eq!(
            evaluate_gate(&[finding(Severity::Critical)], &policy).outcome,
            GateOutcome::Block
        );
    }

    #[test]
    fn outcome_is_monotone_in_severity() {
        let policy = default_policy_for_stage(GateStage::PrePush);
        let order = [
            Severity::Info,
            Severity::Warn,
            Severity::Error,
            Severity::Critical,
        ];
        let rank = |outcome: GateOutcome| match outcome {
            GateOutcome::Allow => 0,
            GateOutcome::Warn => 1,
            GateOutcome::Block => 2,
        };
        let mut previous = 0;
        for severity in order {
            let current = rank(evaluate_gate(&[finding(severity)], &policy).outcome);
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn resolves_defaults_when_override_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve_policy_for_stage(GateStage::PreCommit, dir.path());
        assert_eq!(resolved.policy, default_policy_for_stage(GateStage::PreCommit));
        assert_eq!(resolved.trace.source, PolicySource::Default);
        assert_eq!(resolved.trace.bundle, "gate-policy.default.PRE_COMMIT");
        assert_eq!(resolved.trace.hash.len(), 64);
    }

    #[test]
    fn resolves_project_override_when_present() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(POLICY_OVERRIDE_FILE),
            r#"{"stages":{"PRE_COMMIT":{"block_on_or_above":"ERROR","warn_on_or_above":"INFO"}}}"#,
        )
        .unwrap();
        let resolved = resolve_policy_for_stage(GateStage::PreCommit, dir.path());
        assert_eq!(resolved.policy.block_on_or_above, Severity::Error);
        assert_eq!(resolved.policy.warn_on_or_above, Severity::Info);
        assert_eq!(resolved.trace.source, PolicySource::ProjectPolicy);
    }

    #[test]
    fn malformed_override_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(POLICY_OVERRIDE_FILE), "not json").unwrap();
        let resolved = resolve_policy_for_stage(GateStage::PrePush, dir.path());
        assert_eq!(resolved.policy, default_policy_for_stage(GateStage::PrePush));
        assert_eq!(resolved.trace.source, PolicySource::Default);
    }
}
