//! Churn and hotspot analytics: aggregate file churn/ownership from
//! history, join it with findings into technical-risk signals, and
//! rank the riskiest files deterministically.

pub mod churn;
pub mod rank;
pub mod risk;

pub use churn::{
    churn_log_args, collect_file_churn_ownership, parse_churn_log, ChurnOptions,
    FileChurnOwnershipSignal, HistorySource, COMMIT_MARKER,
};
pub use rank::{rank_file_hotspots, FileHotspotRank, HotspotRankingWeights, ScoreBreakdown};
pub use risk::{compose_file_technical_risk_signals, FileTechnicalRiskSignal, SeverityBuckets};
