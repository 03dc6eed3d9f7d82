//! Finding traceability — a pure post-pass that attaches file/line
//! provenance to findings after evaluation. Already-populated finding
//! fields are never overwritten.

use gate_core::rules::Condition;
use gate_core::{Fact, Finding, RuleDefinition};
use regex::Regex;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default)]
struct Trace {
    matched: bool,
    file_path: Option<String>,
    lines: Option<Vec<u32>>,
    matched_by: Option<String>,
    source: Option<String>,
}

/// Attach file/line context to findings by re-tracing each finding's
/// originating rule condition against the fact set.
///
/// `FileContent` conditions get 1-based, deduped, ascending line
/// numbers for every line where any term or pattern occurs.
/// `Heuristic` conditions copy location from the triggering fact;
/// when the finding already names a file, only facts for that exact
/// path contribute lines. `Not` findings stay file-agnostic.
pub fn attach_finding_traceability(
    findings: Vec<Finding>,
    rules: &[RuleDefinition],
    facts: &[Fact],
) -> Vec<Finding> {
    let rule_by_id: FxHashMap<&str, &RuleDefinition> =
        rules.iter().map(|rule| (rule.id.as_str(), rule)).collect();

    findings
        .into_iter()
        .map(|mut finding| {
            let Some(rule) = rule_by_id.get(finding.rule_id.as_str()) else {
                return finding;
            };
            let trace = trace_condition(&rule.when, rule, facts, finding.file_path.as_deref());
            if !trace.matched {
                return finding;
            }
            if finding.file_path.is_none() {
                finding.file_path = trace.file_path;
            }
            if finding.lines.is_none() {
                finding.lines = trace.lines;
            }
            if finding.matched_by.is_none() {
                finding.matched_by = trace.matched_by;
            }
            if finding.source.is_none() {
                finding.source = trace.source;
            }
            finding
        })
        .collect()
}

fn trace_condition(
    condition: &Condition,
    rule: &RuleDefinition,
    facts: &[Fact],
    narrowed_path: Option<&str>,
) -> Trace {
    match condition {
        Condition::FileChange { filter } => {
            let mut paths: Vec<(&str, &str)> = facts
                .iter()
                .filter_map(|fact| match fact {
                    Fact::FileChange {
                        path,
                        change_type,
                        source,
                    } => {
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
                        Some((path.as_str(), source.as_str()))
                    }
                    _ => None,
                })
                .collect();
            paths.sort();
            match paths.first() {
                Some((path, source)) => Trace {
                    matched: true,
                    file_path: Some((*path).to_string()),
                    matched_by: Some("FileChange".to_string()),
                    source: Some((*source).to_string()),
                    ..Trace::default()
                },
                None => Trace::default(),
            }
        }
        Condition::FileContent { contains, regex } => {
            trace_file_content(contains, regex, rule, facts)
        }
        Condition::Heuristic { filter } => {
            let mut matches: Vec<&Fact> = facts
                .iter()
                .filter(|fact| match fact {
                    Fact::Heuristic {
                        rule_id,
                        code,
                        file_path,
                        ..
                    } => {
                        if *rule_id != filter.rule_id {
                            return false;
                        }
                        if let Some(expected) = &filter.code {
                            if code != expected {
                                return false;
                            }
                        }
                        if let Some(prefix) = &filter.file_path_prefix {
                            if !file_path
                                .as_deref()
                                .is_some_and(|path| path.starts_with(prefix.as_str()))
                            {
                                return false;
                            }
                        }
                        true
                    }
                    _ => false,
                })
                .collect();
            matches.sort_by_key(|fact| fact.path().unwrap_or(""));

            // When the finding already names a file, only facts for
            // that exact path contribute; no fact for that path means
            // the lines stay unset.
            let contributing: Vec<&Fact> = match narrowed_path {
                Some(narrowed) => matches
                    .iter()
                    .copied()
                    .filter(|fact| fact.path() == Some(narrowed))
                    .collect(),
                None => matches,
            };

            match contributing.first() {
                Some(fact) => {
                    let mut lines: Vec<u32> = contributing
                        .iter()
                        .filter_map(|fact| match fact {
                            Fact::Heuristic { lines, .. } => lines.clone(),
                            _ => None,
                        })
                        .flatten()
                        .collect();
                    lines.sort_unstable();
                    lines.dedup();
                    Trace {
                        matched: true,
                        file_path: fact.path().map(str::to_string),
                        lines: if lines.is_empty() { None } else { Some(lines) },
                        matched_by: Some("Heuristic".to_string()),
                        source: Some(fact.source().to_string()),
                    }
                }
                None => Trace::default(),
            }
        }
        Condition::All { conditions } => {
            let child_traces: Vec<Trace> = conditions
                .iter()
                .map(|child| trace_condition(child, rule, facts, narrowed_path))
                .collect();
            if child_traces.iter().any(|trace| !trace.matched) {
                return Trace::default();
            }
            let mut located: Vec<&Trace> = child_traces
                .iter()
                .filter(|trace| trace.file_path.is_some())
                .collect();
            located.sort_by_key(|trace| trace.file_path.as_deref().unwrap_or(""));
            match located.first() {
                Some(representative) => {
                    let mut lines: Vec<u32> = child_traces
                        .iter()
                        .filter(|trace| trace.file_path == representative.file_path)
                        .filter_map(|trace| trace.lines.clone())
                        .flatten()
                        .collect();
                    lines.sort_unstable();
                    lines.dedup();
                    Trace {
                        matched: true,
                        file_path: representative.file_path.clone(),
                        lines: if lines.is_empty() { None } else { Some(lines) },
                        matched_by: Some("All".to_string()),
                        source: representative.source.clone(),
                    }
                }
                None => Trace {
                    matched: true,
                    matched_by: Some("All".to_string()),
                    ..Trace::default()
                },
            }
        }
        Condition::Any { conditions } => {
            for child in conditions {
                let trace = trace_condition(child, rule, facts, narrowed_path);
                if trace.matched {
                    return trace;
                }
            }
            Trace::default()
        }
        Condition::Not { condition } => {
            let inner = trace_condition(condition, rule, facts, narrowed_path);
            Trace {
                matched: !inner.matched,
                matched_by: if inner.matched {
                    None
                } else {
                    Some("Not".to_string())
                },
                ..Trace::default()
            }
        }
    }
}

fn trace_file_content(
    contains: &[String],
    patterns: &[String],
    rule: &RuleDefinition,
    facts: &[Fact],
) -> Trace {
    let compiled: Vec<Regex> = patterns
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect();
    if compiled.len() != patterns.len() {
        return Trace::default();
    }

    let mut matches: Vec<(&str, &str, &str)> = facts
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
                if !contains.iter().all(|term| content.contains(term.as_str())) {
                    return None;
                }
                if !compiled.iter().all(|regex| regex.is_match(content)) {
                    return None;
                }
                Some((path.as_str(), content.as_str(), source.as_str()))
            }
            _ => None,
        })
        .collect();
    matches.sort_by_key(|(path, ..)| *path);

    let Some((path, content, source)) = matches.first() else {
        return Trace::default();
    };

    let mut lines: Vec<u32> = content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            contains
                .iter()
                .any(|term| !term.is_empty() && line.contains(term.as_str()))
                || compiled.iter().any(|regex| regex.is_match(line))
        })
        .map(|(index, _)| index as u32 + 1)
        .collect();
    lines.sort_unstable();
    lines.dedup();

    Trace {
        matched: true,
        file_path: Some((*path).to_string()),
        lines: if lines.is_empty() { None } else { Some(lines) },
        matched_by: Some("FileContent".to_string()),
        source: Some((*source).to_string()),
    }
}
