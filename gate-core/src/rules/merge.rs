//! Rule set merging with locked-baseline protection.

use rustc_hash::FxHashMap;
use tracing::warn;

use super::definition::{RuleDefinition, RuleSet};

/// Caller-controlled merge behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeOptions {
    /// Allow a project rule to lower the severity of a locked
    /// baseline rule. Surfaced only when the project rule source
    /// explicitly sets `allow_override_locked`.
    pub allow_downgrade_baseline: bool,
}

/// Merge project rules over a baseline rule set.
///
/// A project rule with the same `id` replaces the baseline rule,
/// unless the baseline rule is locked and the project rule would
/// reduce its severity without `allow_downgrade_baseline` — in that
/// case the baseline rule is kept unchanged. Project rules with new
/// ids are appended after the baseline, first occurrence of an id
/// wins within each source.
pub fn merge_rule_sets(
    baseline: &[RuleDefinition],
    project: &[RuleDefinition],
    options: MergeOptions,
) -> RuleSet {
    let mut overrides: FxHashMap<&str, &RuleDefinition> = FxHashMap::default();
    for rule in project {
        overrides.entry(rule.id.as_str()).or_insert(rule);
    }

    let mut merged: RuleSet = Vec::with_capacity(baseline.len() + project.len());
    let mut seen: FxHashMap<&str, ()> = FxHashMap::default();

    for rule in baseline {
        if seen.contains_key(rule.id.as_str()) {
            continue;
        }
        seen.insert(rule.id.as_str(), ());

        match overrides.get(rule.id.as_str()) {
            Some(replacement) => {
                let downgrades = replacement.severity < rule.severity;
                if rule.locked && downgrades && !options.allow_downgrade_baseline {
                    warn!(
                        rule_id = %rule.id,
                        baseline = %rule.severity,
                        requested = %replacement.severity,
                        "ignoring project override: locked baseline rule may not be weakened"
                    );
                    merged.push(rule.clone());
                } else {
                    merged.push((*replacement).clone());
                }
            }
            None => merged.push(rule.clone()),
        }
    }

    for rule in project {
        if seen.contains_key(rule.id.as_str()) {
            continue;
        }
        seen.insert(rule.id.as_str(), ());
        merged.push(rule.clone());
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Condition, FindingTemplate, Severity};

    fn rule(id: &str, severity: Severity, locked: bool) -> RuleDefinition {
        RuleDefinition {
            id: id.to_string(),
            description: format!("rule {id}"),
            severity,
            platform: "generic".to_string(),
            locked,
            when: Condition::any_file_change(),
            then: FindingTemplate {
                code: None,
                message: "matched".to_string(),
            },
            scope: None,
        }
    }

    #[test]
    fn project_rule_replaces_unlocked_baseline() {
        let baseline = vec![rule("a", Severity::Error, false)];
        let project = vec![rule("a", Severity::Info, false)];
        let merged = merge_rule_sets(&baseline, &project, MergeOptions::default());
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].severity, Severity::Info);
    }

    #[test]
    fn locked_baseline_rejects_silent_downgrade() {
        let baseline = vec![rule("secrets", Severity::Critical, true)];
        let project = vec![rule("secrets", Severity::Warn, false)];
        let merged = merge_rule_sets(&baseline, &project, MergeOptions::default());
        assert_eq!(merged[0].severity, Severity::Critical);
        assert!(merged[0].locked);
    }

    #[test]
    fn locked_baseline_accepts_explicit_downgrade() {
        let baseline = vec![rule("secrets", Severity::Critical, true)];
        let project = vec![rule("secrets", Severity::Warn, false)];
        let merged = merge_rule_sets(
            &baseline,
            &project,
            MergeOptions {
                allow_downgrade_baseline: true,
            },
        );
        assert_eq!(merged[0].severity, Severity::Warn);
    }

    #[test]
    fn locked_baseline_accepts_escalation() {
        let baseline = vec![rule("secrets", Severity::Error, true)];
        let project = vec![rule("secrets", Severity::Critical, false)];
        let merged = merge_rule_sets(&baseline, &project, MergeOptions::default());
        assert_eq!(merged[0].severity, Severity::Critical);
    }

    #[test]
    fn new_project_rules_append_after_baseline() {
        let baseline = vec![rule("a", Severity::Warn, false)];
        let project = vec![rule("b", Severity::Error, false)];
        let merged = merge_rule_sets(&baseline, &project, MergeOptions::default());
        assert_eq!(
            merged.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn duplicate_ids_within_a_source_keep_first() {
        let baseline = vec![
            rule("a", Severity::Warn, false),
            rule("a", Severity::Critical, false),
        ];
        let merged = merge_rule_sets(&baseline, &[], MergeOptions::default());
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].severity, Severity::Warn);
    }
}
