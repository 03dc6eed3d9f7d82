//! Evidence ledger — the persisted, hash-fingerprinted audit record
//! of one gate run, chained to prior runs.
//!
//! The record is built deterministically (sorted findings, sorted
//! maps, content hashes over key-sorted JSON), written whole exactly
//! once per run, and read back leniently: a missing, corrupt, or
//! version-mismatched prior record is "no history", never an error.

pub mod build;
pub mod load;
pub mod ruleset_state;
pub mod schema;
pub mod write;

pub use build::{build_evidence, build_evidence_at, BuildEvidenceParams};
pub use load::load_previous_evidence;
pub use ruleset_state::{build_ruleset_state, RulesetStateParams};
pub use schema::{
    EvidenceOutcome, EvidenceRecord, EvaluationMetrics, LedgerEntry, PlatformState,
    RulesCoverage, RulesetStateEntry, SeverityMetrics, Snapshot, SnapshotFinding,
    TddBddSnapshot, EVIDENCE_FILE_NAME, EVIDENCE_SCHEMA_VERSION,
};
pub use write::write_evidence;
