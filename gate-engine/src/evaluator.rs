//! Rule evaluator — matches facts against rule conditions and emits
//! findings, one per matching fact for localizable conditions.

use gate_core::rules::{Condition, FileChangeWhere, HeuristicWhere};
use gate_core::{Fact, Finding, RuleDefinition};
use regex::Regex;
use rustc_hash::FxHashSet;
use tracing::warn;

/// Outcome of one evaluation pass, including which rules were
/// exercised. Rules whose condition failed to compile (bad regex)
/// count as unevaluated instead of aborting the run.
#[derive(Debug, Clone, Default)]
pub struct RuleEvaluation {
    pub findings: Vec<Finding>,
    pub evaluated_rule_ids: Vec<String>,
    pub matched_rule_ids: Vec<String>,
    pub unevaluated_rule_ids: Vec<String>,
}

/// Evaluate every rule against the fact set and return the findings.
pub fn evaluate_rules(rules: &[RuleDefinition], facts: &[Fact]) -> Vec<Finding> {
    evaluate_rules_with_coverage(rules, facts).findings
}

/// Evaluate every rule and additionally report coverage: which rule
/// ids were evaluated, which matched, and which could not be
/// evaluated at all.
pub fn evaluate_rules_with_coverage(rules: &[RuleDefinition], facts: &[Fact]) -> RuleEvaluation {
    let mut evaluation = RuleEvaluation::default();

    for rule in rules {
        match evaluate_condition(&rule.when, rule, facts) {
            Ok(matches) => {
                evaluation.evaluated_rule_ids.push(rule.id.clone());
                if matches.is_empty() {
                    continue;
                }
                evaluation.matched_rule_ids.push(rule.id.clone());
                for matched in matches {
                    evaluation.findings.push(finding_for(rule, matched));
                }
            }
            Err(error) => {
                warn!(rule_id = %rule.id, %error, "rule condition could not be evaluated");
                evaluation.unevaluated_rule_ids.push(rule.id.clone());
            }
        }
    }

    evaluation
}

/// One successful condition match, carrying whatever location the
/// condition itself could establish. Line numbers are left to the
/// traceability pass.
#[derive(Debug, Clone, Default)]
struct ConditionMatch {
    file_path: Option<String>,
    lines: Option<Vec<u32>>,
    matched_by: Option<&'static str>,
    source: Option<String>,
    severity_override: Option<gate_core::Severity>,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid regex {pattern:?}: {message}")]
struct ConditionError {
    pattern: String,
    message: String,
}

fn finding_for(rule: &RuleDefinition, matched: ConditionMatch) -> Finding {
    Finding {
        rule_id: rule.id.clone(),
        // A fact-level severity can raise but never lower the rule's,
        // so stage escalation of the rule still takes effect.
        severity: matched
            .severity_override
            .map_or(rule.severity, |severity| severity.max(rule.severity)),
        code: rule.finding_code().to_string(),
        message: rule.then.message.clone(),
        file_path: matched.file_path,
        lines: matched.lines,
        matched_by: matched.matched_by.map(str::to_string),
        source: matched.source,
    }
}

fn evaluate_condition(
    condition: &Condition,
    rule: &RuleDefinition,
    facts: &[Fact],
) -> Result<Vec<ConditionMatch>, ConditionError> {
    match condition {
        Condition::FileChange { filter } => Ok(match_file_changes(filter.as_ref(), rule, facts)),
        Condition::FileContent { contains, regex } => {
            match_file_contents(contains, regex, rule, facts)
        }
        Condition::Heuristic { filter } => Ok(match_heuristics(filter, rule, facts)),
        Condition::All { conditions } => {
            let mut all: Vec<Vec<ConditionMatch>> = Vec::with_capacity(conditions.len());
            for child in conditions {
                let matches = evaluate_condition(child, rule, facts)?;
                if matches.is_empty() {
                    return Ok(Vec::new());
                }
                all.push(matches);
            }
            if all.is_empty() {
                return Ok(Vec::new());
            }
            // One finding for the combination; location comes from
            // the traceability pass.
            Ok(vec![ConditionMatch {
                matched_by: Some("All"),
                ..ConditionMatch::default()
            }])
        }
        Condition::Any { conditions } => {
            for child in conditions {
                let matches = evaluate_condition(child, rule, facts)?;
                if let Some(first) = matches.into_iter().next() {
                    return Ok(vec![first]);
                }
            }
            Ok(Vec::new())
        }
        Condition::Not { condition } => {
            let inner = evaluate_condition(condition, rule, facts)?;
            if inner.is_empty() {
                Ok(vec![ConditionMatch {
                    matched_by: Some("Not"),
                    ..ConditionMatch::default()
                }])
            } else {
                Ok(Vec::new())
            }
        }
    }
}

fn match_file_changes(
    filter: Option<&FileChangeWhere>,
    rule: &RuleDefinition,
    facts: &[Fact],
) -> Vec<ConditionMatch> {
    facts
        .iter()
        .filter_map(|fact| match fact {
            Fact::FileChange {
                path,
                change_type,
                source,
            } => {
                if !rule.applies_to_path(path) {
                    return None;
                }
                if let Some(filter) = filter {
                    if let Some(prefix) = &filter.path_prefix {
                        if !path.starts_with(prefix.as_str()) {
                            return None;
                        }
                    }
                    if let Some(expected) = filter.change_type {
                        if *change_type != expected {
                            return None;
                        }
                    }
                }
                Some(ConditionMatch {
                    file_path: Some(path.clone()),
                    matched_by: Some("FileChange"),
                    source: Some(source.clone()),
                    ..ConditionMatch::default()
                })
            }
            _ => None,
        })
        .collect()
}

fn match_file_contents(
    contains: &[String],
    patterns: &[String],
    rule: &RuleDefinition,
    facts: &[Fact],
) -> Result<Vec<ConditionMatch>, ConditionError> {
    let compiled: Vec<Regex> = patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|error| ConditionError {
                pattern: pattern.clone(),
                message: error.to_string(),
            })
        })
        .collect::<Result<_, _>>()?;

    Ok(facts
        .iter()
        .filter_map(|fact| match fact {
            Fact::FileContent {
                path,
                content,
                source,
            } => {
                if !rule.applies_to_path(path) {
                    return None;
                }
                // AND across terms within one file.
                if !contains.iter().all(|term| content.contains(term.as_str())) {
                    return None;
                }
                if !compiled.iter().all(|regex| regex.is_match(content)) {
                    return None;
                }
                Some(ConditionMatch {
                    file_path: Some(path.clone()),
                    matched_by: Some("FileContent"),
                    source: Some(source.clone()),
                    ..ConditionMatch::default()
                })
            }
            _ => None,
        })
        .collect())
}

fn match_heuristics(
    filter: &HeuristicWhere,
    rule: &RuleDefinition,
    facts: &[Fact],
) -> Vec<ConditionMatch> {
    facts
        .iter()
        .filter_map(|fact| match fact {
            Fact::Heuristic {
                rule_id,
                severity,
                code,
                file_path,
                lines,
                source,
                ..
            } => {
                // Rule scope applies to heuristic facts too; a fact
                // without a path cannot satisfy a scoped rule.
                if rule.scope.is_some()
                    && !file_path
                        .as_deref()
                        .is_some_and(|path| rule.applies_to_path(path))
                {
                    return None;
                }
                if *rule_id != filter.rule_id {
                    return None;
                }
                if let Some(expected) = &filter.code {
                    if code != expected {
                        return None;
                    }
                }
                if let Some(prefix) = &filter.file_path_prefix {
                    if !file_path
                        .as_deref()
                        .is_some_and(|path| path.starts_with(prefix.as_str()))
                    {
                        return None;
                    }
                }
                Some(ConditionMatch {
                    file_path: file_path.clone(),
                    lines: lines
                        .clone()
                        .and_then(Finding::normalize_lines),
                    matched_by: Some("Heuristic"),
                    source: Some(source.clone()),
                    severity_override: Some(*severity),
                })
            }
            _ => None,
        })
        .collect()
}

/// Distinct heuristic rule ids observed in the fact set, in first
/// appearance order. Used to derive one baseline rule per producer.
pub fn observed_heuristic_rule_ids(facts: &[Fact]) -> Vec<String> {
    let mut seen = FxHashSet::default();
    let mut ids = Vec::new();
    for fact in facts {
        if let Fact::Heuristic { rule_id, .. } = fact {
            if seen.insert(rule_id.as_str()) {
                ids.push(rule_id.clone());
            }
        }
    }
    ids
}
