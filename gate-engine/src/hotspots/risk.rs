//! Technical-risk signals: the join of churn/ownership with
//! accumulated findings, keyed by repo-relative path.

use std::path::Path;

use gate_core::{Finding, Severity};
use rustc_hash::{FxHashMap, FxHashSet};

use super::churn::FileChurnOwnershipSignal;

/// Findings reduced to the 4-bucket enterprise scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeverityBuckets {
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

/// Churn fields joined with per-file finding aggregates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FileTechnicalRiskSignal {
    pub path: String,
    pub churn_commits: u32,
    pub churn_distinct_authors: u32,
    pub churn_added_lines: u64,
    pub churn_deleted_lines: u64,
    pub churn_total_lines: u64,
    pub churn_last_touched_at: Option<String>,
    pub findings_total: u32,
    pub findings_by_enterprise_severity: SeverityBuckets,
    pub findings_distinct_rules: u32,
    pub findings_with_lines: u32,
    pub findings_without_lines: u32,
}

fn to_enterprise_bucket(severity: Severity) -> fn(&mut SeverityBuckets) -> &mut u32 {
    match severity {
        Severity::Critical => |buckets| &mut buckets.critical,
        Severity::Error => |buckets| &mut buckets.high,
        Severity::Warn => |buckets| &mut buckets.medium,
        Severity::Info => |buckets| &mut buckets.low,
    }
}

fn normalize_relative(path: &str, repo_root: &Path) -> String {
    let normalized = path.replace('\\', "/");
    let trimmed = normalized.strip_prefix("./").unwrap_or(&normalized);
    let candidate = Path::new(trimmed);
    if candidate.is_absolute() {
        if let Ok(relative) = candidate.strip_prefix(repo_root) {
            let relative = relative.to_string_lossy().replace('\\', "/");
            if !relative.is_empty() {
                return relative;
            }
        }
    }
    trimmed.to_string()
}

#[derive(Default)]
struct FindingAggregate {
    total: u32,
    buckets: SeverityBuckets,
    rules: FxHashSet<String>,
    with_lines: u32,
    without_lines: u32,
}

/// Join churn signals with findings into one risk signal per file.
///
/// Paths from both sides normalize to one repo-relative key, whether
/// they arrive absolute under the repo root or already relative; the
/// result is the union, so a file with findings but no recent churn
/// still gets a signal.
pub fn compose_file_technical_risk_signals(
    churn: &[FileChurnOwnershipSignal],
    findings: &[Finding],
    repo_root: &Path,
    extensions: &[String],
) -> Vec<FileTechnicalRiskSignal> {
    let included = |path: &str| {
        extensions.is_empty()
            || extensions.iter().any(|extension| {
                let suffix = extension.trim_start_matches('.');
                path.rsplit_once('.')
                    .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(suffix))
            })
    };

    let mut aggregates: FxHashMap<String, FindingAggregate> = FxHashMap::default();
    for finding in findings {
        let Some(file_path) = finding.file_path.as_deref() else {
            continue;
        };
        let key = normalize_relative(file_path, repo_root);
        if key.is_empty() || !included(&key) {
            continue;
        }
        let aggregate = aggregates.entry(key).or_default();
        aggregate.total += 1;
        *to_enterprise_bucket(finding.severity)(&mut aggregate.buckets) += 1;
        aggregate.rules.insert(finding.rule_id.clone());
        match &finding.lines {
            Some(lines) if !lines.is_empty() => aggregate.with_lines += 1,
            _ => aggregate.without_lines += 1,
        }
    }

    let mut signals: FxHashMap<String, FileTechnicalRiskSignal> = FxHashMap::default();
    for item in churn {
        let key = normalize_relative(&item.path, repo_root);
        if key.is_empty() || !included(&key) {
            continue;
        }
        signals.insert(
            key.clone(),
            FileTechnicalRiskSignal {
                path: key,
                churn_commits: item.commits,
                churn_distinct_authors: item.distinct_authors,
                churn_added_lines: item.churn_added_lines,
                churn_deleted_lines: item.churn_deleted_lines,
                churn_total_lines: item.churn_total_lines,
                churn_last_touched_at: item.last_touched_at.clone(),
                ..FileTechnicalRiskSignal::default()
            },
        );
    }

    for (key, aggregate) in aggregates {
        let signal = signals
            .entry(key.clone())
            .or_insert_with(|| FileTechnicalRiskSignal {
                path: key,
                ..FileTechnicalRiskSignal::default()
            });
        signal.findings_total = aggregate.total;
        signal.findings_by_enterprise_severity = aggregate.buckets;
        signal.findings_distinct_rules = aggregate.rules.len() as u32;
        signal.findings_with_lines = aggregate.with_lines;
        signal.findings_without_lines = aggregate.without_lines;
    }

    let mut result: Vec<FileTechnicalRiskSignal> = signals.into_values().collect();
    result.sort_by(|a, b| a.path.cmp(&b.path));
    result
}
