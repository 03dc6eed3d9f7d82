//! Ruleset state — one fingerprint entry per active rule source, so
//! evidence diffs show exactly which rules were in force.

use gate_core::hash::content_hash;
use gate_core::{GateStage, PolicyTrace, RuleDefinition};
use serde_json::json;

use crate::schema::RulesetStateEntry;

/// Inputs for one run's ruleset state.
#[derive(Debug, Clone, Default)]
pub struct RulesetStateParams<'a> {
    /// One `(platform, bundle name, rules)` triple per detected
    /// platform baseline.
    pub baseline_bundles: Vec<(&'a str, &'a str, &'a [RuleDefinition])>,
    /// Active config bundles as `(bundle name, rules)`.
    pub config_bundles: Vec<(&'a str, &'a [RuleDefinition])>,
    pub heuristic_rules: &'a [RuleDefinition],
    pub heuristics_bundle: &'a str,
    pub project_rules: &'a [RuleDefinition],
    pub policy_trace: Option<&'a PolicyTrace>,
    pub stage: Option<GateStage>,
}

/// Build the ruleset state entries for one run.
///
/// The `heuristics` entry hashes the rules *and* the stage, because
/// heuristic severities are escalated per stage: the same heuristic
/// bundle under a stricter stage is a different effective ruleset.
pub fn build_ruleset_state(params: &RulesetStateParams<'_>) -> Vec<RulesetStateEntry> {
    let mut entries = Vec::new();

    for (platform, bundle, rules) in &params.baseline_bundles {
        entries.push(RulesetStateEntry {
            platform: (*platform).to_string(),
            bundle: (*bundle).to_string(),
            hash: content_hash(rules),
        });
    }

    for (bundle, rules) in &params.config_bundles {
        entries.push(RulesetStateEntry {
            platform: "bundle".to_string(),
            bundle: (*bundle).to_string(),
            hash: content_hash(rules),
        });
    }

    if !params.heuristic_rules.is_empty() {
        entries.push(RulesetStateEntry {
            platform: "heuristics".to_string(),
            bundle: params.heuristics_bundle.to_string(),
            hash: content_hash(&json!({
                "rules": params.heuristic_rules,
                "stage": params.stage,
            })),
        });
    }

    if !params.project_rules.is_empty() {
        entries.push(RulesetStateEntry {
            platform: "project".to_string(),
            bundle: "project-rules".to_string(),
            hash: content_hash(&params.project_rules),
        });
    }

    if let Some(trace) = params.policy_trace {
        entries.push(RulesetStateEntry {
            platform: "policy".to_string(),
            bundle: trace.bundle.clone(),
            hash: trace.hash.clone(),
        });
    }

    entries
}
