//! Determinism and purity properties over the evaluation and ranking
//! passes: identical inputs always produce identical outputs, and
//! input order never leaks into results.

use gate_core::policy::default_policy_for_stage;
use gate_core::rules::{Condition, FindingTemplate};
use gate_core::{evaluate_gate, Fact, Finding, GateOutcome, GateStage, RuleDefinition, Severity};
use gate_engine::evaluate_rules;
use gate_engine::hotspots::{
    rank_file_hotspots, FileTechnicalRiskSignal, HotspotRankingWeights, SeverityBuckets,
};
use proptest::prelude::*;

fn content_rule() -> RuleDefinition {
    RuleDefinition {
        id: "backend.console.log".to_string(),
        description: "console.log left in sources".to_string(),
        severity: Severity::Warn,
        platform: "backend".to_string(),
        locked: false,
        when: Condition::FileContent {
            contains: vec!["console.log(".to_string()],
            regex: Vec::new(),
        },
        then: FindingTemplate {
            code: None,
            message: "remove console.log".to_string(),
        },
        scope: None,
    }
}

fn fact_strategy() -> impl Strategy<Value = Fact> {
    ("[a-z]{1,8}", "[ -~]{0,80}").prop_map(|(name, body)| Fact::FileContent {
        path: format!("src/{name}.ts"),
        content: body,
        source: "git:staged".to_string(),
    })
}

fn signal_strategy() -> impl Strategy<Value = FileTechnicalRiskSignal> {
    (
        "[a-z]{1,8}",
        0u32..20,
        0u32..6,
        0u64..2_000,
        0u32..4,
        0u32..4,
        0u32..6,
        0u32..6,
    )
        .prop_map(
            |(name, commits, authors, lines, critical, high, with_lines, without_lines)| {
                FileTechnicalRiskSignal {
                    path: format!("src/{name}.ts"),
                    churn_commits: commits,
                    churn_distinct_authors: authors,
                    churn_added_lines: lines,
                    churn_deleted_lines: 0,
                    churn_total_lines: lines,
                    churn_last_touched_at: None,
                    findings_total: critical + high,
                    findings_by_enterprise_severity: SeverityBuckets {
                        critical,
                        high,
                        ..SeverityBuckets::default()
                    },
                    findings_distinct_rules: (critical + high).min(3),
                    findings_with_lines: with_lines,
                    findings_without_lines: without_lines,
                }
            },
        )
}

fn outcome_rank(outcome: GateOutcome) -> u8 {
    match outcome {
        GateOutcome::Allow => 0,
        GateOutcome::Warn => 1,
        GateOutcome::Block => 2,
    }
}

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

proptest! {
    #[test]
    fn evaluation_is_pure(facts in proptest::collection::vec(fact_strategy(), 0..20)) {
        let rules = vec![content_rule()];
        let before = facts.clone();
        let first = evaluate_rules(&rules, &facts);
        let second = evaluate_rules(&rules, &facts);
        prop_assert_eq!(first, second);
        prop_assert_eq!(before, facts);
    }

    #[test]
    fn gate_outcome_is_monotone_in_severity(
        lower_index in 0usize..4,
        upper_index in 0usize..4,
        stage_index in 0usize..3,
    ) {
        let severities = [Severity::Info, Severity::Warn, Severity::Error, Severity::Critical];
        let stages = [GateStage::PreCommit, GateStage::PrePush, GateStage::Ci];
        let (low, high) = if lower_index <= upper_index {
            (severities[lower_index], severities[upper_index])
        } else {
            (severities[upper_index], severities[lower_index])
        };
        let policy = default_policy_for_stage(stages[stage_index]);
        let low_outcome = evaluate_gate(&[finding(low)], &policy).outcome;
        let high_outcome = evaluate_gate(&[finding(high)], &policy).outcome;
        prop_assert!(outcome_rank(high_outcome) >= outcome_rank(low_outcome));
    }

    #[test]
    fn ranking_ignores_input_order(
        signals in proptest::collection::vec(signal_strategy(), 0..20),
        top_n in 1u32..25,
    ) {
        // Scores aggregate per path, so duplicate paths would be two
        // independent entries; keep one signal per path.
        let mut unique: std::collections::BTreeMap<String, FileTechnicalRiskSignal> =
            std::collections::BTreeMap::new();
        for signal in signals {
            unique.entry(signal.path.clone()).or_insert(signal);
        }
        let forward: Vec<FileTechnicalRiskSignal> = unique.into_values().collect();
        let mut backward = forward.clone();
        backward.reverse();

        let weights = HotspotRankingWeights::default();
        let ranked_forward = rank_file_hotspots(&forward, top_n, &weights).unwrap();
        let ranked_backward = rank_file_hotspots(&backward, top_n, &weights).unwrap();
        prop_assert_eq!(ranked_forward, ranked_backward);
    }

    #[test]
    fn top_ranked_file_always_normalizes_to_one(
        signals in proptest::collection::vec(signal_strategy(), 1..20),
    ) {
        let ranked =
            rank_file_hotspots(&signals, 50, &HotspotRankingWeights::default()).unwrap();
        if let Some(top) = ranked.first() {
            prop_assert_eq!(top.normalized_score, 1.0);
        }
        for window in ranked.windows(2) {
            prop_assert!(window[0].raw_score >= window[1].raw_score);
        }
    }
}
