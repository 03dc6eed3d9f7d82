//! Hotspot ranking: a fixed-weight score over risk signals with a
//! fully deterministic order and max-normalized scores.

use gate_core::GateError;

use super::risk::FileTechnicalRiskSignal;

/// Fixed scoring weights. The exact numbers are tuning constants; the
/// ordering and determinism guarantees are what callers rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotspotRankingWeights {
    pub severity_critical: u64,
    pub severity_high: u64,
    pub severity_medium: u64,
    pub severity_low: u64,
    pub churn_commit: u64,
    pub churn_lines_per_10: u64,
    pub churn_lines_cap: u64,
    pub ownership_distinct_author: u64,
    pub rule_diversity: u64,
    pub traceability_penalty: u64,
}

impl Default for HotspotRankingWeights {
    fn default() -> Self {
        Self {
            severity_critical: 100,
            severity_high: 40,
            severity_medium: 15,
            severity_low: 5,
            churn_commit: 4,
            churn_lines_per_10: 1,
            churn_lines_cap: 200,
            ownership_distinct_author: 3,
            rule_diversity: 6,
            traceability_penalty: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreBreakdown {
    pub severity_score: u64,
    pub churn_score: u64,
    pub ownership_score: u64,
    pub rule_diversity_score: u64,
    pub traceability_penalty_score: u64,
}

impl ScoreBreakdown {
    fn raw(&self) -> u64 {
        self.severity_score
            + self.churn_score
            + self.ownership_score
            + self.rule_diversity_score
            + self.traceability_penalty_score
    }
}

/// One ranked hotspot, 1-based rank, normalized to the top raw score.
#[derive(Debug, Clone, PartialEq)]
pub struct FileHotspotRank {
    pub rank: u32,
    pub path: String,
    pub raw_score: u64,
    pub normalized_score: f64,
    pub breakdown: ScoreBreakdown,
}

fn score(signal: &FileTechnicalRiskSignal, weights: &HotspotRankingWeights) -> ScoreBreakdown {
    let buckets = signal.findings_by_enterprise_severity;
    let severity_score = u64::from(buckets.critical) * weights.severity_critical
        + u64::from(buckets.high) * weights.severity_high
        + u64::from(buckets.medium) * weights.severity_medium
        + u64::from(buckets.low) * weights.severity_low;

    let capped_lines = signal.churn_total_lines.min(weights.churn_lines_cap);
    let churn_score = u64::from(signal.churn_commits) * weights.churn_commit
        + (capped_lines / 10) * weights.churn_lines_per_10;

    let ownership_score =
        u64::from(signal.churn_distinct_authors) * weights.ownership_distinct_author;
    let rule_diversity_score = u64::from(signal.findings_distinct_rules) * weights.rule_diversity;
    let penalty_units = signal
        .findings_without_lines
        .saturating_sub(signal.findings_with_lines);
    let traceability_penalty_score = u64::from(penalty_units) * weights.traceability_penalty;

    ScoreBreakdown {
        severity_score,
        churn_score,
        ownership_score,
        rule_diversity_score,
        traceability_penalty_score,
    }
}

fn round_six_decimals(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

/// Rank the `top_n` riskiest files.
///
/// Files with an all-zero score are excluded. Order is raw score
/// descending with path-ascending tie-break, so identical inputs
/// always produce identical rankings. Normalized scores divide by the
/// maximum raw score (top file exactly 1.0), rounded to 6 decimals.
pub fn rank_file_hotspots(
    signals: &[FileTechnicalRiskSignal],
    top_n: u32,
    weights: &HotspotRankingWeights,
) -> Result<Vec<FileHotspotRank>, GateError> {
    if top_n == 0 {
        return Err(GateError::InvalidParameter {
            name: "top_n".to_string(),
            message: "must be a positive integer".to_string(),
        });
    }

    let mut scored: Vec<(&FileTechnicalRiskSignal, ScoreBreakdown, u64)> = signals
        .iter()
        .map(|signal| {
            let breakdown = score(signal, weights);
            let raw = breakdown.raw();
            (signal, breakdown, raw)
        })
        .filter(|(_, _, raw)| *raw > 0)
        .collect();

    scored.sort_by(|(a, _, raw_a), (b, _, raw_b)| {
        raw_b.cmp(raw_a).then_with(|| a.path.cmp(&b.path))
    });

    let max_raw = scored.first().map(|(_, _, raw)| *raw).unwrap_or(0);

    Ok(scored
        .into_iter()
        .take(top_n as usize)
        .enumerate()
        .map(|(index, (signal, breakdown, raw))| FileHotspotRank {
            rank: index as u32 + 1,
            path: signal.path.clone(),
            raw_score: raw,
            normalized_score: if max_raw > 0 {
                round_six_decimals(raw as f64 / max_raw as f64)
            } else {
                0.0
            },
            breakdown,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotspots::risk::SeverityBuckets;

    fn signal(path: &str, commits: u32, high: u32) -> FileTechnicalRiskSignal {
        FileTechnicalRiskSignal {
            path: path.to_string(),
            churn_commits: commits,
            findings_total: high,
            findings_by_enterprise_severity: SeverityBuckets {
                high,
                ..SeverityBuckets::default()
            },
            ..FileTechnicalRiskSignal::default()
        }
    }

    #[test]
    fn top_file_normalizes_to_exactly_one() {
        let signals = vec![signal("a.ts", 10, 2), signal("b.ts", 1, 0)];
        let ranked = rank_file_hotspots(&signals, 10, &HotspotRankingWeights::default()).unwrap();
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[0].normalized_score, 1.0);
        assert!(ranked[1].normalized_score < 1.0);
    }

    #[test]
    fn ties_break_by_path_ascending() {
        let signals = vec![signal("z.ts", 5, 1), signal("a.ts", 5, 1)];
        let ranked = rank_file_hotspots(&signals, 10, &HotspotRankingWeights::default()).unwrap();
        assert_eq!(ranked[0].path, "a.ts");
        assert_eq!(ranked[1].path, "z.ts");
        assert_eq!(ranked[0].raw_score, ranked[1].raw_score);
    }

    #[test]
    fn zero_score_files_are_excluded() {
        let signals = vec![signal("quiet.ts", 0, 0), signal("hot.ts", 2, 1)];
        let ranked = rank_file_hotspots(&signals, 10, &HotspotRankingWeights::default()).unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].path, "hot.ts");
    }

    #[test]
    fn churn_lines_are_capped() {
        let weights = HotspotRankingWeights::default();
        let mut capped = signal("a.ts", 0, 0);
        capped.churn_total_lines = 10_000;
        let mut at_cap = signal("b.ts", 0, 0);
        at_cap.churn_total_lines = weights.churn_lines_cap;
        let ranked = rank_file_hotspots(&[capped, at_cap], 10, &weights).unwrap();
        assert_eq!(ranked[0].raw_score, ranked[1].raw_score);
    }

    #[test]
    fn zero_top_n_fails_before_scoring() {
        let error = rank_file_hotspots(&[], 0, &HotspotRankingWeights::default()).unwrap_err();
        assert!(matches!(error, GateError::InvalidParameter { .. }));
    }

    #[test]
    fn ranking_is_idempotent() {
        let signals = vec![signal("a.ts", 3, 1), signal("b.ts", 7, 0)];
        let weights = HotspotRankingWeights::default();
        assert_eq!(
            rank_file_hotspots(&signals, 10, &weights).unwrap(),
            rank_file_hotspots(&signals, 10, &weights).unwrap()
        );
    }
}
