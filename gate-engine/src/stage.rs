//! Stage-based severity escalation for heuristic-derived rules.

use gate_core::{GateStage, RuleDefinition, Severity};

/// Floor severity for heuristic rules per stage. Stricter stages must
/// never see a weaker heuristic severity than earlier ones.
pub fn heuristic_severity_floor(stage: GateStage) -> Severity {
    match stage {
        GateStage::PreCommit | GateStage::PrePush | GateStage::Ci => Severity::Error,
    }
}

/// Raise every heuristic rule's severity to at least the stage floor.
pub fn escalate_heuristic_rules_for_stage(
    rules: Vec<RuleDefinition>,
    stage: GateStage,
) -> Vec<RuleDefinition> {
    let floor = heuristic_severity_floor(stage);
    rules
        .into_iter()
        .map(|mut rule| {
            rule.severity = rule.severity.max(floor);
            rule
        })
        .collect()
}
